//! The `.cmmds` document model and the layer merge
//!
//! A document has a base layer (`settings` + `commands`) and a `temporary`
//! overlay with the same shape. The overlay shadows the base by exact name and
//! its `runInCurrentTerminal` flag wins over the base one. Everything here is
//! pure: reading and writing the file lives in [`crate::store`].
//!
//! ```yaml
//! settings:
//!   runInCurrentTerminal: true
//! commands:
//!   build: cargo build
//! temporary:
//!   settings: {}
//!   commands:
//!     build: cargo build --release
//! ```

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Command name -> shell command line
pub type CommandMap = BTreeMap<String, String>;

/// The persisted configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Base settings
    #[serde(
        default,
        deserialize_with = "deserialize_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub settings: Option<Settings>,

    /// Base commands
    #[serde(
        default,
        deserialize_with = "deserialize_commands",
        skip_serializing_if = "Option::is_none"
    )]
    pub commands: Option<CommandMap>,

    /// Temporary overlay
    #[serde(
        default,
        deserialize_with = "deserialize_section",
        skip_serializing_if = "Option::is_none"
    )]
    pub temporary: Option<Overlay>,

    /// Top-level keys the tool does not know about, kept so a write does not drop them
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Settings block, shared by the base layer and the overlay
///
/// `shell` is only read from the base layer. A value of the wrong type is
/// ignored with a warning rather than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub run_in_current_terminal: Option<bool>,

    #[serde(
        default,
        deserialize_with = "deserialize_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub shell: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The `temporary` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    #[serde(default, deserialize_with = "deserialize_overlay_settings")]
    pub settings: Settings,

    #[serde(default, deserialize_with = "deserialize_overlay_commands")]
    pub commands: CommandMap,
}

/// Merged, read-only view of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    pub commands: CommandMap,
    pub run_in_current_terminal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
}

impl EffectiveConfig {
    /// Look up a runnable command. Blank command lines count as missing.
    pub fn command(&self, name: &str) -> Option<&str> {
        self.commands
            .get(name)
            .map(String::as_str)
            .filter(|cmd| !is_blank(cmd))
    }

    /// Command names in display order
    pub fn names(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }
}

impl Document {
    /// The overlay, created empty if the document has none
    pub fn overlay_mut(&mut self) -> &mut Overlay {
        self.temporary.get_or_insert_with(Overlay::default)
    }

    /// Base command line for `name`
    pub fn base_command(&self, name: &str) -> Option<&str> {
        self.commands
            .as_ref()
            .and_then(|cmds| cmds.get(name))
            .map(String::as_str)
    }

    /// Overlay command line for `name`, ignoring blank entries
    pub fn overlay_command(&self, name: &str) -> Option<&str> {
        self.temporary
            .as_ref()
            .and_then(|overlay| overlay.commands.get(name))
            .map(String::as_str)
            .filter(|cmd| !is_blank(cmd))
    }

    /// Base `runInCurrentTerminal`, if set
    pub fn base_run_mode(&self) -> Option<bool> {
        self.settings
            .as_ref()
            .and_then(|s| s.run_in_current_terminal)
    }

    /// Overlay `runInCurrentTerminal`, if set
    pub fn overlay_run_mode(&self) -> Option<bool> {
        self.temporary
            .as_ref()
            .and_then(|o| o.settings.run_in_current_terminal)
    }
}

/// True for empty or whitespace-only values
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Merge the overlay onto the base layer.
///
/// Commands are the union of both layers with the overlay winning on
/// collisions; blank overlay entries mean "no override". The run flag
/// resolves overlay -> base -> `true`, and an explicit `false` is a value,
/// not an absence.
pub fn compute_effective(doc: &Document) -> EffectiveConfig {
    let mut commands = doc.commands.clone().unwrap_or_default();
    if let Some(overlay) = &doc.temporary {
        for (name, cmd) in &overlay.commands {
            if !is_blank(cmd) {
                commands.insert(name.clone(), cmd.clone());
            }
        }
    }

    let run_in_current_terminal = doc
        .overlay_run_mode()
        .or_else(|| doc.base_run_mode())
        .unwrap_or(true);

    EffectiveConfig {
        commands,
        run_in_current_terminal,
        shell: doc.settings.as_ref().and_then(|s| s.shell.clone()),
    }
}

fn deserialize_commands<'de, D>(deserializer: D) -> Result<Option<CommandMap>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = deserialize_section(deserializer)?;
    Ok(raw.map(|entries| {
        entries
            .into_iter()
            .filter_map(|(name, value)| scalar_to_string(value).map(|cmd| (name, cmd)))
            .collect()
    }))
}

/// A mapping section. `null` is absent; any other non-mapping value, or a
/// mapping that does not fit, is dropped with a warning.
fn deserialize_section<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value @ Value::Mapping(_) => match serde_yaml::from_value(value) {
            Ok(section) => Ok(Some(section)),
            Err(e) => {
                log::warn!("Ignoring malformed section: {}", e);
                Ok(None)
            }
        },
        other => {
            log::warn!("Ignoring section that is not a mapping: {:?}", other);
            Ok(None)
        }
    }
}

fn deserialize_overlay_settings<'de, D>(deserializer: D) -> Result<Settings, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_section(deserializer).map(Option::unwrap_or_default)
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b)),
        other => {
            log::warn!("Ignoring runInCurrentTerminal {:?}: expected true or false", other);
            Ok(None)
        }
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => {
            log::warn!("Ignoring shell {:?}: expected a string", other);
            Ok(None)
        }
    }
}

fn deserialize_overlay_commands<'de, D>(deserializer: D) -> Result<CommandMap, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_commands(deserializer).map(Option::unwrap_or_default)
}

/// Numbers and booleans are accepted as command lines; `null` drops the entry
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn commands(pairs: &[(&str, &str)]) -> CommandMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run_mode(value: Option<bool>) -> Settings {
        Settings {
            run_in_current_terminal: value,
            ..Default::default()
        }
    }

    #[test]
    fn test_overlay_shadows_base() {
        let doc = Document {
            settings: Some(run_mode(Some(true))),
            commands: Some(commands(&[("build", "echo A")])),
            temporary: Some(Overlay {
                settings: Settings::default(),
                commands: commands(&[("build", "echo B")]),
            }),
            ..Default::default()
        };

        let eff = compute_effective(&doc);
        assert_eq!(eff.commands, commands(&[("build", "echo B")]));
        assert!(eff.run_in_current_terminal);
    }

    #[test]
    fn test_empty_document() {
        let eff = compute_effective(&Document::default());
        assert!(eff.commands.is_empty());
        assert!(eff.run_in_current_terminal);
        assert_eq!(eff.shell, None);
    }

    #[test]
    fn test_overlay_true_beats_base_false() {
        let doc = Document {
            settings: Some(run_mode(Some(false))),
            temporary: Some(Overlay {
                settings: run_mode(Some(true)),
                commands: CommandMap::new(),
            }),
            ..Default::default()
        };
        assert!(compute_effective(&doc).run_in_current_terminal);
    }

    #[test]
    fn test_explicit_false_is_not_absence() {
        let doc = Document {
            settings: Some(run_mode(Some(true))),
            temporary: Some(Overlay {
                settings: run_mode(Some(false)),
                commands: CommandMap::new(),
            }),
            ..Default::default()
        };
        assert!(!compute_effective(&doc).run_in_current_terminal);

        let base_only = Document {
            settings: Some(run_mode(Some(false))),
            ..Default::default()
        };
        assert!(!compute_effective(&base_only).run_in_current_terminal);
    }

    #[test]
    fn test_blank_overlay_entry_is_no_override() {
        let doc = Document {
            commands: Some(commands(&[("test", "cargo test")])),
            temporary: Some(Overlay {
                settings: Settings::default(),
                commands: commands(&[("test", "   "), ("lint", "")]),
            }),
            ..Default::default()
        };

        let eff = compute_effective(&doc);
        assert_eq!(eff.command("test"), Some("cargo test"));
        assert_eq!(eff.command("lint"), None);
        assert!(!eff.commands.contains_key("lint"));
    }

    #[test]
    fn test_shell_comes_from_base() {
        let doc = Document {
            settings: Some(Settings {
                shell: Some("bash".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(compute_effective(&doc).shell.as_deref(), Some("bash"));
    }

    #[test]
    fn test_parse_full_document() {
        let yaml = r#"
settings:
  runInCurrentTerminal: false
  shell: zsh
commands:
  build: cargo build
  count: 42
  flag: true
  gone: ~
temporary:
  settings:
    runInCurrentTerminal: true
  commands:
    build: cargo build --release
"#;
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.base_run_mode(), Some(false));
        assert_eq!(doc.overlay_run_mode(), Some(true));
        assert_eq!(doc.base_command("count"), Some("42"));
        assert_eq!(doc.base_command("flag"), Some("true"));
        assert_eq!(doc.base_command("gone"), None);
        assert_eq!(doc.overlay_command("build"), Some("cargo build --release"));

        let eff = compute_effective(&doc);
        assert_eq!(eff.command("build"), Some("cargo build --release"));
        assert!(eff.run_in_current_terminal);
        assert_eq!(eff.shell.as_deref(), Some("zsh"));
    }

    #[test]
    fn test_null_sections_parse() {
        let yaml = "settings: ~\ncommands: ~\ntemporary:\n  settings: ~\n  commands: ~\n";
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        let eff = compute_effective(&doc);
        assert!(eff.commands.is_empty());
        assert!(eff.run_in_current_terminal);
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let yaml = "version: 2\nsettings:\n  theme: dark\ncommands:\n  a: echo a\n";
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert!(doc.extra.contains_key("version"));

        let written = serde_yaml::to_string(&doc).unwrap();
        let reparsed: Document = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reparsed, doc);
        assert!(written.contains("theme: dark"));
    }

    #[test]
    fn test_mistyped_settings_are_ignored() {
        let yaml = "settings:\n  runInCurrentTerminal: yes\n  shell: 3\ncommands:\n  build: echo A\n";
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.base_run_mode(), None);
        assert_eq!(doc.base_command("build"), Some("echo A"));

        let eff = compute_effective(&doc);
        assert!(eff.run_in_current_terminal);
        assert_eq!(eff.shell, None);
    }

    #[test]
    fn test_non_mapping_sections_fall_back() {
        let yaml = "settings: fast\ncommands:\n  build: echo A\ntemporary: [1, 2]\n";
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.settings, None);
        assert_eq!(doc.temporary, None);
        assert_eq!(doc.base_command("build"), Some("echo A"));

        let yaml = "commands: nope\ntemporary:\n  settings: 5\n  commands: [a]\n";
        let doc: Document = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.commands, None);
        let overlay = doc.temporary.unwrap();
        assert_eq!(overlay.settings, Settings::default());
        assert!(overlay.commands.is_empty());
    }

    fn command_map() -> impl Strategy<Value = CommandMap> {
        prop::collection::btree_map("[a-z]{1,6}", "[a-z][a-z ]{0,10}", 0..6)
    }

    fn doc_from(
        base: CommandMap,
        overlay: CommandMap,
        base_run: Option<bool>,
        overlay_run: Option<bool>,
    ) -> Document {
        Document {
            settings: Some(run_mode(base_run)),
            commands: Some(base),
            temporary: Some(Overlay {
                settings: run_mode(overlay_run),
                commands: overlay,
            }),
            ..Default::default()
        }
    }

    proptest! {
        #[test]
        fn overlay_wins_on_every_collision(base in command_map(), overlay in command_map()) {
            let eff = compute_effective(&doc_from(base.clone(), overlay.clone(), None, None));

            let mut expected = base;
            expected.extend(overlay);
            prop_assert_eq!(eff.commands, expected);
        }

        #[test]
        fn run_mode_defaults_to_true(base in command_map(), overlay in command_map()) {
            let eff = compute_effective(&doc_from(base, overlay, None, None));
            prop_assert!(eff.run_in_current_terminal);
        }

        #[test]
        fn run_mode_follows_precedence(
            base_run in proptest::option::of(any::<bool>()),
            overlay_run in proptest::option::of(any::<bool>()),
        ) {
            let eff = compute_effective(&doc_from(CommandMap::new(), CommandMap::new(), base_run, overlay_run));
            prop_assert_eq!(eff.run_in_current_terminal, overlay_run.or(base_run).unwrap_or(true));
        }

        #[test]
        fn empty_overlay_yields_base(base in command_map(), base_run in proptest::option::of(any::<bool>())) {
            let eff = compute_effective(&doc_from(base.clone(), CommandMap::new(), base_run, None));
            prop_assert_eq!(eff.commands, base);
            prop_assert_eq!(eff.run_in_current_terminal, base_run.unwrap_or(true));
        }
    }
}
