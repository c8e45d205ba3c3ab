use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// A single named skip predicate over an entry's base name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RuleRepr", into = "RuleRepr")]
pub enum SkipRule {
    /// Names starting with `.`.
    Dotfiles,
    /// Names starting with the given prefix.
    Prefix(String),
    /// Names ending with the given suffix.
    Suffix(String),
    /// Keep only files whose name matches the pattern. Directories are
    /// exempt so traversal can still descend into them.
    KeepMatching(Regex),
    /// Drop files whose name matches the pattern. Directories are
    /// exempt, as above.
    DropMatching(Regex),
}

impl SkipRule {
    fn matches(&self, name: &str, is_dir: bool) -> bool {
        match self {
            SkipRule::Dotfiles => name.starts_with('.'),
            SkipRule::Prefix(prefix) => name.starts_with(prefix.as_str()),
            SkipRule::Suffix(suffix) => name.ends_with(suffix.as_str()),
            SkipRule::KeepMatching(pattern) => !is_dir && !pattern.is_match(name),
            SkipRule::DropMatching(pattern) => !is_dir && pattern.is_match(name),
        }
    }
}

impl PartialEq for SkipRule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SkipRule::Dotfiles, SkipRule::Dotfiles) => true,
            (SkipRule::Prefix(a), SkipRule::Prefix(b)) => a == b,
            (SkipRule::Suffix(a), SkipRule::Suffix(b)) => a == b,
            (SkipRule::KeepMatching(a), SkipRule::KeepMatching(b)) => a.as_str() == b.as_str(),
            (SkipRule::DropMatching(a), SkipRule::DropMatching(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for SkipRule {}

/// Serialized face of [`SkipRule`]; regex rules round-trip as their
/// pattern source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RuleRepr {
    Dotfiles,
    Prefix(String),
    Suffix(String),
    KeepMatching(String),
    DropMatching(String),
}

impl From<SkipRule> for RuleRepr {
    fn from(rule: SkipRule) -> Self {
        match rule {
            SkipRule::Dotfiles => RuleRepr::Dotfiles,
            SkipRule::Prefix(p) => RuleRepr::Prefix(p),
            SkipRule::Suffix(s) => RuleRepr::Suffix(s),
            SkipRule::KeepMatching(r) => RuleRepr::KeepMatching(r.as_str().to_string()),
            SkipRule::DropMatching(r) => RuleRepr::DropMatching(r.as_str().to_string()),
        }
    }
}

impl TryFrom<RuleRepr> for SkipRule {
    type Error = Error;

    fn try_from(repr: RuleRepr) -> Result<Self, Error> {
        Ok(match repr {
            RuleRepr::Dotfiles => SkipRule::Dotfiles,
            RuleRepr::Prefix(p) => SkipRule::Prefix(p),
            RuleRepr::Suffix(s) => SkipRule::Suffix(s),
            RuleRepr::KeepMatching(p) => SkipRule::KeepMatching(compile(&p)?),
            RuleRepr::DropMatching(p) => SkipRule::DropMatching(compile(&p)?),
        })
    }
}

/// An ordered set of skip predicates, combined as a logical OR: an
/// entry is excluded from the snapshot when any rule matches. Order
/// affects diagnostics only, never the verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkipSet {
    rules: Vec<SkipRule>,
}

impl Default for SkipSet {
    /// The conventional default: dotfiles are skipped.
    fn default() -> Self {
        Self {
            rules: vec![SkipRule::Dotfiles],
        }
    }
}

impl SkipSet {
    /// A set that skips nothing.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds the dotfile rule.
    pub fn skip_dotfiles(&mut self) {
        self.rules.push(SkipRule::Dotfiles);
    }

    /// Skips names starting with `prefix`.
    pub fn skip_prefix(&mut self, prefix: &str) {
        self.rules.push(SkipRule::Prefix(prefix.to_string()));
    }

    /// Skips names ending with `suffix`.
    pub fn skip_suffix(&mut self, suffix: &str) {
        self.rules.push(SkipRule::Suffix(suffix.to_string()));
    }

    /// Keeps only files matching `pattern`; directories still
    /// traverse.
    pub fn keep_matching(&mut self, pattern: &str) -> Result<(), Error> {
        self.rules.push(SkipRule::KeepMatching(compile(pattern)?));
        Ok(())
    }

    /// Drops files matching `pattern`; directories still traverse.
    pub fn drop_matching(&mut self, pattern: &str) -> Result<(), Error> {
        self.rules.push(SkipRule::DropMatching(compile(pattern)?));
        Ok(())
    }

    /// Whether an entry with this base name is excluded.
    pub fn is_skipped(&self, name: &str, is_dir: bool) -> bool {
        self.rules.iter().any(|rule| rule.matches(name, is_dir))
    }
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| Error::InvalidArgument(format!("bad pattern {pattern:?}: {e}")))
}
