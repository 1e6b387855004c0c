//! Loading integrations from JSON rule files.
//!
//! A rule file is a JSON array of integration objects:
//!
//! ```json
//! [
//!   {
//!     "name": "AspNetMvc5",
//!     "method_replacements": [
//!       {
//!         "caller": { "assembly": "System.Web.Mvc" },
//!         "target": {
//!           "assembly": "System.Web.Mvc",
//!           "type": "System.Web.Mvc.Async.AsyncControllerActionInvoker",
//!           "method": "BeginInvokeAction",
//!           "signature": "00 04 1C 1C 1C 1C 1C"
//!         },
//!         "wrapper": {
//!           "assembly": "Datadog.Trace.ClrProfiler.Managed",
//!           "type": "Datadog.Trace.ClrProfiler.Integrations.AspNetMvcIntegration",
//!           "method": "BeginInvokeAction",
//!           "signature": [0, 4, 28, 28, 28, 28, 28]
//!         }
//!       }
//!     ]
//!   }
//! ]
//! ```
//!
//! Loading is lenient at every level. A file that cannot be read or parsed contributes no
//! integrations; an entry without a name is skipped; a malformed replacement is skipped while
//! its siblings are kept; a missing `caller`, `target` or `wrapper` matches anything. Unknown
//! fields are ignored. Every skip is logged as a warning, and loading from files never fails.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use log::{info, warn};
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::{
    config::ProfilerConfig,
    integrations::{Integration, MethodReference, MethodReplacement, SignatureBlob},
    Error, Result,
};

/// Parses integrations from the text of a rule file.
///
/// Malformed entries are skipped with a warning.
///
/// # Errors
/// Returns [`Error::Parse`] if `text` is not valid JSON, and [`Error::InvalidRuleFile`] if the
/// document is not an array
pub fn load_integrations_from_str(text: &str) -> Result<Vec<Integration>> {
    let document: Value = serde_json::from_str(text)?;
    integrations_from_document(&document)
}

/// Parses integrations from a reader providing the contents of a rule file.
///
/// # Errors
/// Returns [`Error::Parse`] if reading fails or the data is not valid JSON, and
/// [`Error::InvalidRuleFile`] if the document is not an array
pub fn load_integrations_from_reader<R: Read>(reader: R) -> Result<Vec<Integration>> {
    let document: Value = serde_json::from_reader(reader)?;
    integrations_from_document(&document)
}

/// Loads the integrations of one rule file.
///
/// A file that cannot be opened or parsed is logged and contributes nothing.
pub fn load_integrations_from_file(path: &Path) -> Vec<Integration> {
    let loaded = File::open(path)
        .map_err(Error::from)
        .and_then(|file| load_integrations_from_reader(BufReader::new(file)));

    match loaded {
        Ok(integrations) => {
            info!(
                "Loaded {} integrations from {}",
                integrations.len(),
                path.display()
            );
            integrations
        }
        Err(error) => {
            warn!(
                "Failed to load integrations from {}: {}",
                path.display(),
                error
            );
            Vec::new()
        }
    }
}

/// Loads the integrations of several rule files.
///
/// Files are parsed in parallel; the result lists the integrations of the first file first,
/// each file's integrations in file order.
pub fn load_integrations_from_files<P>(paths: &[P]) -> Vec<Integration>
where
    P: AsRef<Path> + Sync,
{
    paths
        .par_iter()
        .map(|path| load_integrations_from_file(path.as_ref()))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Loads the integrations of all rule files named by `config`
pub fn load_integrations_from_config(config: &ProfilerConfig) -> Vec<Integration> {
    load_integrations_from_files(config.integration_paths())
}

fn integrations_from_document(document: &Value) -> Result<Vec<Integration>> {
    let Value::Array(entries) = document else {
        return Err(Error::InvalidRuleFile(format!(
            "expected an array of integrations, found {}",
            value_kind(document)
        )));
    };

    let integrations = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match integration_from_json(entry) {
            Ok(integration) => Some(integration),
            Err(error) => {
                warn!("Skipping integration #{}: {}", index, error);
                None
            }
        })
        .collect();

    Ok(integrations)
}

fn integration_from_json(value: &Value) -> Result<Integration> {
    let Some(entry) = value.as_object() else {
        return Err(Error::InvalidIntegration(format!(
            "expected an object, found {}",
            value_kind(value)
        )));
    };

    let name = match entry.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.as_str(),
        _ => {
            return Err(Error::InvalidIntegration(format!(
                "integration name is missing in {}",
                value
            )))
        }
    };

    let mut replacements = Vec::new();
    if let Some(Value::Array(items)) = entry.get("method_replacements") {
        for (index, item) in items.iter().enumerate() {
            match method_replacement_from_json(item) {
                Ok(replacement) => replacements.push(replacement),
                Err(error) => warn!(
                    "Skipping method replacement #{} of integration {}: {}",
                    index, name, error
                ),
            }
        }
    }

    Integration::new(name, replacements)
}

fn method_replacement_from_json(value: &Value) -> Result<MethodReplacement> {
    let Some(entry) = value.as_object() else {
        return Err(malformed_error!(
            "method replacement must be an object, found {}",
            value_kind(value)
        ));
    };

    Ok(MethodReplacement::new(
        method_reference_from_json(entry.get("caller"))?,
        method_reference_from_json(entry.get("target"))?,
        method_reference_from_json(entry.get("wrapper"))?,
    ))
}

fn method_reference_from_json(value: Option<&Value>) -> Result<MethodReference> {
    let Some(Value::Object(entry)) = value else {
        return Ok(MethodReference::default());
    };

    let signature = match entry.get("signature") {
        Some(Value::Array(items)) => SignatureBlob::new(
            items
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|byte| u8::try_from(byte).ok())
                .collect(),
        ),
        Some(Value::String(text)) => SignatureBlob::from_hex_lenient(text),
        _ => SignatureBlob::default(),
    };

    Ok(MethodReference::new(
        string_field(entry, "assembly")?,
        string_field(entry, "type")?,
        string_field(entry, "method")?,
        signature,
    ))
}

fn string_field(entry: &Map<String, Value>, key: &str) -> Result<String> {
    match entry.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(malformed_error!(
            "field '{}' must be a string, found {}",
            key,
            value_kind(other)
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MVC_RULES: &str = r#"[
        {
            "name": "AspNetMvc5",
            "method_replacements": [
                {
                    "caller": { "assembly": "System.Web.Mvc" },
                    "target": {
                        "assembly": "System.Web.Mvc",
                        "type": "System.Web.Mvc.Async.AsyncControllerActionInvoker",
                        "method": "BeginInvokeAction",
                        "signature": "00 04 1C 1C 1C 1C 1C"
                    },
                    "wrapper": {
                        "assembly": "Datadog.Trace.ClrProfiler.Managed",
                        "type": "Datadog.Trace.ClrProfiler.Integrations.AspNetMvcIntegration",
                        "method": "BeginInvokeAction",
                        "signature": [0, 4, 28, 28, 28, 28, 28]
                    }
                }
            ]
        }
    ]"#;

    #[test]
    fn test_load_full_entry() {
        let integrations = load_integrations_from_str(MVC_RULES).unwrap();
        assert_eq!(integrations.len(), 1);

        let integration = &integrations[0];
        assert_eq!(integration.name(), "AspNetMvc5");
        assert_eq!(integration.method_replacements().len(), 1);

        let replacement = &integration.method_replacements()[0];
        assert_eq!(replacement.caller().assembly(), "System.Web.Mvc");
        assert!(replacement.caller().type_name().is_empty());
        assert_eq!(
            replacement.target().type_name(),
            "System.Web.Mvc.Async.AsyncControllerActionInvoker"
        );
        assert_eq!(replacement.target().method(), "BeginInvokeAction");

        let expected = [0x00, 0x04, 0x1C, 0x1C, 0x1C, 0x1C, 0x1C];
        assert_eq!(replacement.target().signature().as_bytes(), &expected);
        assert_eq!(replacement.wrapper().signature().as_bytes(), &expected);
    }

    #[test]
    fn test_missing_references_are_wildcards() {
        let integrations = load_integrations_from_str(
            r#"[{ "name": "Wildcard", "method_replacements": [ {}, { "caller": 5 } ] }]"#,
        )
        .unwrap();

        let replacements = integrations[0].method_replacements();
        assert_eq!(replacements.len(), 2);
        for replacement in replacements {
            assert!(replacement.caller().is_wildcard());
            assert!(replacement.target().is_wildcard());
            assert!(replacement.wrapper().is_wildcard());
        }
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let integrations = load_integrations_from_str(
            r#"[
                { "name": "Good", "method_replacements": [] },
                { "method_replacements": [] },
                { "name": "" },
                { "name": 42 },
                "not an integration"
            ]"#,
        )
        .unwrap();

        assert_eq!(integrations.len(), 1);
        assert_eq!(integrations[0].name(), "Good");
    }

    #[test]
    fn test_malformed_replacement_is_skipped() {
        let integrations = load_integrations_from_str(
            r#"[{
                "name": "Mixed",
                "method_replacements": [
                    { "target": { "assembly": "First" } },
                    "garbage",
                    { "target": { "assembly": ["not", "a", "string"] } },
                    { "target": { "assembly": "Last" } }
                ]
            }]"#,
        )
        .unwrap();

        let targets: Vec<&str> = integrations[0]
            .method_replacements()
            .iter()
            .map(|r| r.target().assembly())
            .collect();
        assert_eq!(targets, vec!["First", "Last"]);
    }

    #[test]
    fn test_method_replacements_optional() {
        let integrations =
            load_integrations_from_str(r#"[{ "name": "A" }, { "name": "B", "method_replacements": {} }]"#)
                .unwrap();
        assert_eq!(integrations.len(), 2);
        assert!(integrations.iter().all(|i| i.method_replacements().is_empty()));
    }

    #[test]
    fn test_signature_forms() {
        let integrations = load_integrations_from_str(
            r#"[{
                "name": "Signatures",
                "method_replacements": [
                    { "target": { "signature": [32, 1, 256, -1, "x", 14] } },
                    { "target": { "signature": "20:01:0e:f" } },
                    { "target": { "signature": { "bytes": 1 } } },
                    { "target": { "signature": null } }
                ]
            }]"#,
        )
        .unwrap();

        let signatures: Vec<&[u8]> = integrations[0]
            .method_replacements()
            .iter()
            .map(|r| r.target().signature().as_bytes())
            .collect();
        assert_eq!(signatures[0], &[0x20, 0x01, 0x0E]);
        assert_eq!(signatures[1], &[0x20, 0x01, 0x0E]);
        assert!(signatures[2].is_empty());
        assert!(signatures[3].is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let integrations = load_integrations_from_str(
            r#"[{ "name": "Extra", "version": 2, "method_replacements": [
                { "target": { "assembly": "X", "generic": true }, "priority": 1 }
            ] }]"#,
        )
        .unwrap();
        assert_eq!(integrations[0].method_replacements()[0].target().assembly(), "X");
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            load_integrations_from_str("{ \"name\": \"A\" }"),
            Err(Error::InvalidRuleFile(_))
        ));
        assert!(matches!(
            load_integrations_from_str("[{ \"name\": "),
            Err(Error::Parse(_))
        ));
        assert!(load_integrations_from_str("[]").unwrap().is_empty());
    }

    #[test]
    fn test_load_from_reader() {
        let integrations = load_integrations_from_reader(MVC_RULES.as_bytes()).unwrap();
        assert_eq!(integrations.len(), 1);
    }

    #[test]
    fn test_load_from_files_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();

        let first = dir.path().join("first.json");
        std::fs::write(&first, r#"[{ "name": "One" }, { "name": "Two" }]"#).unwrap();

        let broken = dir.path().join("broken.json");
        let mut file = File::create(&broken).unwrap();
        file.write_all(b"[{ \"name\": ").unwrap();

        let missing = dir.path().join("missing.json");

        let last = dir.path().join("last.json");
        std::fs::write(&last, r#"[{ "name": "Three" }]"#).unwrap();

        let integrations = load_integrations_from_files(&[first, broken, missing, last]);
        let names: Vec<&str> = integrations.iter().map(Integration::name).collect();
        assert_eq!(names, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_load_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("integrations.json");
        std::fs::write(&path, MVC_RULES).unwrap();

        let config = ProfilerConfig::default().with_integration_path(&path);
        let integrations = load_integrations_from_config(&config);
        assert_eq!(integrations.len(), 1);
        assert_eq!(integrations[0].name(), "AspNetMvc5");
    }
}
