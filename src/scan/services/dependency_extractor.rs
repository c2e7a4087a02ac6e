use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value as JsonValue;

use crate::scan::domain::{Ecosystem, InstalledDependency};
use crate::scan::services::version_matcher::strip_range_prefix;
use crate::shared::security;
use crate::shared::Result;

/// Manifest dependency sections scanned for npm projects.
const NPM_SECTIONS: [&str; 4] = [
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "optionalDependencies",
];

/// Extracts installed dependencies from one manifest or lockfile.
///
/// The file format is chosen from the basename for npm (manifest vs
/// lockfile) and from the ecosystem otherwise. Entries are yielded in file
/// order without dedup; the orchestrator dedups before matching.
pub fn extract_from_file(path: &Path, ecosystem: &Ecosystem) -> Result<Vec<InstalledDependency>> {
    let content = security::read_checked(path, "dependency file")?;
    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match ecosystem {
        Ecosystem::Npm if basename == "package-lock.json" => parse_package_lock(&content),
        Ecosystem::Npm => parse_package_json(&content),
        Ecosystem::PyPi => Ok(parse_requirements(&content)),
        Ecosystem::RubyGems => Ok(parse_gemfile(&content)),
        Ecosystem::Go => Ok(parse_go_mod(&content)),
        Ecosystem::Cargo => parse_cargo_toml(&content),
        Ecosystem::Maven => Ok(parse_pom_xml(&content)),
        other => Ok(parse_package_list(path, &content, other)),
    }
}

/// Parses a generic package-list file (`--file` targets that are not a
/// recognized manifest): plain text, JSON, or YAML.
pub fn extract_from_list_file(path: &Path, ecosystem: &Ecosystem) -> Result<Vec<InstalledDependency>> {
    let content = security::read_checked(path, "package list")?;
    Ok(parse_package_list(path, &content, ecosystem))
}

/// package.json: the four dependency sections, with semver range prefixes
/// stripped from declared versions.
pub fn parse_package_json(content: &str) -> Result<Vec<InstalledDependency>> {
    let root: JsonValue = serde_json::from_str(content)?;
    let mut deps = Vec::new();

    for section in NPM_SECTIONS {
        if let Some(entries) = root.get(section).and_then(JsonValue::as_object) {
            for (name, spec) in entries {
                let version = strip_range_prefix(spec.as_str().unwrap_or(""));
                deps.push(InstalledDependency::new(
                    Ecosystem::Npm,
                    name.clone(),
                    version,
                    section,
                ));
            }
        }
    }

    Ok(deps)
}

/// package-lock.json: the recursive v1 `dependencies` tree (depth tracked
/// in the location label) and the flattened v7+ `packages` map.
pub fn parse_package_lock(content: &str) -> Result<Vec<InstalledDependency>> {
    let root: JsonValue = serde_json::from_str(content)?;
    let mut deps = Vec::new();

    if let Some(tree) = root.get("dependencies").and_then(JsonValue::as_object) {
        walk_lock_tree(tree, 0, &mut deps);
    }

    if let Some(packages) = root.get("packages").and_then(JsonValue::as_object) {
        for (pkg_path, info) in packages {
            // The "" entry is the root project itself.
            if pkg_path.is_empty() {
                continue;
            }
            let Some(version) = info.get("version").and_then(JsonValue::as_str) else {
                continue;
            };
            if version.is_empty() {
                continue;
            }
            deps.push(InstalledDependency::new(
                Ecosystem::Npm,
                package_name_from_lock_path(pkg_path),
                version,
                "packages",
            ));
        }
    }

    Ok(deps)
}

fn walk_lock_tree(tree: &serde_json::Map<String, JsonValue>, depth: usize, out: &mut Vec<InstalledDependency>) {
    for (name, info) in tree {
        let Some(info) = info.as_object() else {
            continue;
        };
        if let Some(version) = info.get("version").and_then(JsonValue::as_str) {
            if !version.is_empty() {
                out.push(InstalledDependency::new(
                    Ecosystem::Npm,
                    name.clone(),
                    version,
                    format!("dependencies (depth {depth})"),
                ));
            }
        }
        if let Some(nested) = info.get("dependencies").and_then(JsonValue::as_object) {
            walk_lock_tree(nested, depth + 1, out);
        }
    }
}

/// Reconstructs a package name from a `packages` map path. The name is
/// everything after the innermost `node_modules/` segment; a leading `@`
/// marks a two-segment scoped name.
fn package_name_from_lock_path(pkg_path: &str) -> String {
    let tail = match pkg_path.rfind("node_modules/") {
        Some(idx) => &pkg_path[idx + "node_modules/".len()..],
        None => pkg_path,
    };
    let mut segments = tail.split('/');
    match segments.next() {
        Some(scope) if scope.starts_with('@') => match segments.next() {
            Some(name) => format!("{scope}/{name}"),
            None => scope.to_string(),
        },
        Some(name) => name.to_string(),
        None => tail.to_string(),
    }
}

/// requirements.txt: one requirement per line, `#` comments and `-r`/`--`
/// option lines skipped, extras (`pkg[extra]`) stripped from the name,
/// version taken from after the comparison operator.
pub fn parse_requirements(content: &str) -> Vec<InstalledDependency> {
    let mut deps = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("-r") || line.starts_with("--") {
            continue;
        }

        let split_at = line
            .find(|c: char| matches!(c, '=' | '>' | '<' | '~' | '!'))
            .unwrap_or(line.len());
        let (name_part, version_part) = line.split_at(split_at);

        let name = match name_part.find('[') {
            Some(idx) => &name_part[..idx],
            None => name_part,
        }
        .trim();
        if name.is_empty() {
            continue;
        }

        let version = version_part
            .trim_start_matches(|c: char| matches!(c, '=' | '>' | '<' | '~' | '!'))
            .trim();

        deps.push(InstalledDependency::new(
            Ecosystem::PyPi,
            name,
            version,
            "requirements",
        ));
    }

    deps
}

/// Gemfile: `gem 'name', 'version'` declarations, version optional.
pub fn parse_gemfile(content: &str) -> Vec<InstalledDependency> {
    static GEM_RE: OnceLock<Regex> = OnceLock::new();
    let re = GEM_RE.get_or_init(|| {
        Regex::new(r#"gem\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#)
            .expect("gem declaration regex is valid")
    });

    re.captures_iter(content)
        .map(|caps| {
            InstalledDependency::new(
                Ecosystem::RubyGems,
                caps.get(1).map_or("", |m| m.as_str()),
                strip_range_prefix(caps.get(2).map_or("", |m| m.as_str())),
                "gems",
            )
        })
        .collect()
}

/// go.mod: the require block and single-line require directives.
pub fn parse_go_mod(content: &str) -> Vec<InstalledDependency> {
    let mut deps = Vec::new();
    let mut in_require_block = false;

    for line in content.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest.starts_with('(') {
                in_require_block = true;
            } else {
                // single-line form: require module/path v1.2.3
                let mut parts = rest.split_whitespace();
                if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                    deps.push(InstalledDependency::new(
                        Ecosystem::Go,
                        name,
                        version,
                        "require",
                    ));
                }
            }
            continue;
        }

        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            let mut parts = line.split_whitespace();
            if let (Some(name), Some(version)) = (parts.next(), parts.next()) {
                deps.push(InstalledDependency::new(
                    Ecosystem::Go,
                    name,
                    version,
                    "require",
                ));
            }
        }
    }

    deps
}

/// Cargo.toml: the `[dependencies]` table, in both the plain string and the
/// `{ version = "..." }` table form.
pub fn parse_cargo_toml(content: &str) -> Result<Vec<InstalledDependency>> {
    let root: toml::Value = toml::from_str(content)?;
    let mut deps = Vec::new();

    if let Some(table) = root.get("dependencies").and_then(toml::Value::as_table) {
        for (name, spec) in table {
            let version = match spec {
                toml::Value::String(v) => v.as_str(),
                toml::Value::Table(t) => t.get("version").and_then(toml::Value::as_str).unwrap_or(""),
                _ => "",
            };
            deps.push(InstalledDependency::new(
                Ecosystem::Cargo,
                name.clone(),
                strip_range_prefix(version),
                "dependencies",
            ));
        }
    }

    Ok(deps)
}

/// pom.xml: `<dependency>` blocks; Maven packages are identified as
/// `groupId:artifactId`.
pub fn parse_pom_xml(content: &str) -> Vec<InstalledDependency> {
    static BLOCK_RE: OnceLock<Regex> = OnceLock::new();
    static FIELD_RE: OnceLock<Regex> = OnceLock::new();
    let block_re = BLOCK_RE.get_or_init(|| {
        Regex::new(r"(?s)<dependency>(.*?)</dependency>").expect("pom block regex is valid")
    });
    let field_re = FIELD_RE.get_or_init(|| {
        Regex::new(r"<(groupId|artifactId|version)>\s*([^<]*?)\s*</(?:groupId|artifactId|version)>")
            .expect("pom field regex is valid")
    });

    let mut deps = Vec::new();
    for block in block_re.captures_iter(content) {
        let body = block.get(1).map_or("", |m| m.as_str());
        let mut group_id = "";
        let mut artifact_id = "";
        let mut version = "";
        for field in field_re.captures_iter(body) {
            let value = field.get(2).map_or("", |m| m.as_str());
            match field.get(1).map_or("", |m| m.as_str()) {
                "groupId" => group_id = value,
                "artifactId" => artifact_id = value,
                "version" => version = value,
                _ => {}
            }
        }
        if group_id.is_empty() || artifact_id.is_empty() {
            continue;
        }
        deps.push(InstalledDependency::new(
            Ecosystem::Maven,
            format!("{group_id}:{artifact_id}"),
            version,
            "dependencies",
        ));
    }

    deps
}

/// Generic package lists: JSON or YAML `{"packages": [...]}` shapes, or
/// plain text with one `name`, `name@version`, or `name==version` per line.
pub fn parse_package_list(path: &Path, content: &str, ecosystem: &Ecosystem) -> Vec<InstalledDependency> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str::<JsonValue>(content)
            .ok()
            .map(|root| package_list_from_value(&root, ecosystem))
            .unwrap_or_default(),
        "yaml" | "yml" => serde_yaml_ng::from_str::<JsonValue>(content)
            .ok()
            .map(|root| package_list_from_value(&root, ecosystem))
            .unwrap_or_default(),
        _ => parse_package_list_text(content, ecosystem),
    }
}

fn package_list_from_value(root: &JsonValue, ecosystem: &Ecosystem) -> Vec<InstalledDependency> {
    let Some(entries) = root.get("packages").and_then(JsonValue::as_array) else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    for entry in entries {
        match entry {
            JsonValue::String(name) => {
                deps.push(InstalledDependency::new(ecosystem.clone(), name.clone(), "", "list"));
            }
            JsonValue::Object(obj) => {
                let Some(name) = obj.get("name").and_then(JsonValue::as_str) else {
                    continue;
                };
                let version = obj.get("version").and_then(JsonValue::as_str).unwrap_or("");
                deps.push(InstalledDependency::new(ecosystem.clone(), name, version, "list"));
            }
            _ => {}
        }
    }
    deps
}

fn parse_package_list_text(content: &str, ecosystem: &Ecosystem) -> Vec<InstalledDependency> {
    let mut deps = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // name@version or name==version; a leading @ belongs to a scope,
        // not a version separator.
        let (name, version) = if let Some((name, version)) = line.split_once("==") {
            (name, version)
        } else if let Some(idx) = line[1..].find('@').map(|i| i + 1) {
            (&line[..idx], &line[idx + 1..])
        } else {
            (line, "")
        };

        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        deps.push(InstalledDependency::new(
            ecosystem.clone(),
            name,
            version.trim(),
            "list",
        ));
    }
    deps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_json_sections_and_prefix_stripping() {
        let content = r#"{
            "name": "app",
            "dependencies": { "@ctrl/deluge": "^7.2.2" },
            "devDependencies": { "left-pad": "~1.3.0" },
            "peerDependencies": { "react": ">=18.0.0" },
            "optionalDependencies": { "fsevents": "2.3.2" }
        }"#;

        let deps = parse_package_json(content).unwrap();
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0].name, "@ctrl/deluge");
        assert_eq!(deps[0].version, "7.2.2");
        assert_eq!(deps[0].location, "dependencies");
        assert_eq!(deps[1].version, "1.3.0");
        assert_eq!(deps[1].location, "devDependencies");
        assert_eq!(deps[2].version, "18.0.0");
    }

    #[test]
    fn test_parse_package_json_invalid_is_error() {
        assert!(parse_package_json("{ not json").is_err());
    }

    #[test]
    fn test_parse_package_lock_nested_tree_tracks_depth() {
        let content = r#"{
            "dependencies": {
                "a": {
                    "version": "1.0.0",
                    "dependencies": {
                        "b": { "version": "2.0.0" }
                    }
                }
            }
        }"#;

        let deps = parse_package_lock(content).unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].location, "dependencies (depth 0)");
        assert_eq!(deps[1].name, "b");
        assert_eq!(deps[1].location, "dependencies (depth 1)");
    }

    #[test]
    fn test_parse_package_lock_packages_map_scoped_names() {
        let content = r#"{
            "packages": {
                "": { "version": "0.0.1" },
                "node_modules/@ctrl/deluge": { "version": "7.2.2" },
                "node_modules/lodash": { "version": "4.17.21" },
                "node_modules/a/node_modules/b": { "version": "3.0.0" },
                "node_modules/no-version": {}
            }
        }"#;

        let deps = parse_package_lock(content).unwrap();
        let mut names: Vec<&str> = deps.iter().map(|d| d.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["@ctrl/deluge", "b", "lodash"]);
        assert!(deps.iter().all(|d| d.location == "packages"));
    }

    #[test]
    fn test_parse_requirements() {
        let content = "\n# comment\nrequests==2.31.0\nurllib3>=1.26.0\nflask[async]==3.0.0\n-r other.txt\nbare-package\n";
        let deps = parse_requirements(content);
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0].name, "requests");
        assert_eq!(deps[0].version, "2.31.0");
        assert_eq!(deps[1].version, "1.26.0");
        assert_eq!(deps[2].name, "flask");
        assert_eq!(deps[3].name, "bare-package");
        assert_eq!(deps[3].version, "");
    }

    #[test]
    fn test_parse_gemfile() {
        let content = "source 'https://rubygems.org'\ngem 'rails', '7.1.0'\ngem \"puma\"\n";
        let deps = parse_gemfile(content);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "rails");
        assert_eq!(deps[0].version, "7.1.0");
        assert_eq!(deps[1].name, "puma");
        assert_eq!(deps[1].version, "");
    }

    #[test]
    fn test_parse_go_mod_block_and_single_line() {
        let content = "module example.com/app\n\nrequire github.com/pkg/errors v0.9.1\n\nrequire (\n\tgolang.org/x/text v0.14.0\n\tgithub.com/stretchr/testify v1.9.0 // indirect\n)\n";
        let deps = parse_go_mod(content);
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "github.com/pkg/errors");
        assert_eq!(deps[0].version, "v0.9.1");
        assert_eq!(deps[1].name, "golang.org/x/text");
    }

    #[test]
    fn test_parse_cargo_toml_string_and_table_forms() {
        let content = "[package]\nname = \"app\"\n\n[dependencies]\nserde = \"1.0\"\ntokio = { version = \"1.35\", features = [\"full\"] }\nlocal-dep = { path = \"../local\" }\n";
        let deps = parse_cargo_toml(content).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].name, "local-dep");
        assert_eq!(deps[0].version, "");
        assert_eq!(deps[1].name, "serde");
        assert_eq!(deps[1].version, "1.0");
        assert_eq!(deps[2].name, "tokio");
        assert_eq!(deps[2].version, "1.35");
    }

    #[test]
    fn test_parse_pom_xml() {
        let content = r#"<project>
          <dependencies>
            <dependency>
              <groupId>org.apache.commons</groupId>
              <artifactId>commons-lang3</artifactId>
              <version>3.14.0</version>
            </dependency>
            <dependency>
              <groupId>junit</groupId>
              <artifactId>junit</artifactId>
            </dependency>
          </dependencies>
        </project>"#;

        let deps = parse_pom_xml(content);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "org.apache.commons:commons-lang3");
        assert_eq!(deps[0].version, "3.14.0");
        assert_eq!(deps[1].name, "junit:junit");
        assert_eq!(deps[1].version, "");
    }

    #[test]
    fn test_parse_package_list_text() {
        let content = "# list\nlodash@4.17.21\nrequests==2.31.0\n@ctrl/deluge@7.2.2\nbare\n";
        let deps = parse_package_list_text(content, &Ecosystem::Npm);
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0].name, "lodash");
        assert_eq!(deps[0].version, "4.17.21");
        assert_eq!(deps[1].name, "requests");
        assert_eq!(deps[2].name, "@ctrl/deluge");
        assert_eq!(deps[2].version, "7.2.2");
        assert_eq!(deps[3].version, "");
    }

    #[test]
    fn test_parse_package_list_json_both_shapes() {
        let json = r#"{"packages": ["a", {"name": "b", "version": "1.0.0"}, 42]}"#;
        let deps = parse_package_list(Path::new("list.json"), json, &Ecosystem::PyPi);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "a");
        assert_eq!(deps[1].version, "1.0.0");
    }

    #[test]
    fn test_parse_package_list_yaml() {
        let yaml = "packages:\n  - name: evil-pkg\n    version: 1.0.0\n";
        let deps = parse_package_list(Path::new("list.yaml"), yaml, &Ecosystem::Npm);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "evil-pkg");
    }
}
