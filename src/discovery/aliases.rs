//! Alias tables for distributions, operating systems and architectures.
//!
//! Entries are written `NAME:alias1,alias2`. Matching is a case-insensitive
//! substring test of every alias (the name itself included) against some
//! piece of evidence, such as a directory name or a vendor string. The
//! first entry with a matching alias wins, so order entries from most to
//! least specific (`x86_64` before `x86`).

/// Built-in OS aliases, used when the config declares none.
pub const DEFAULT_OS_ALIASES: &[&str] = &[
    "LINUX:linux",
    "MACOSX:darwin,macosx,macos,mac os x,osx",
    "WINDOWS:windows,win32,win64",
];

/// Built-in architecture aliases, used when the config declares none.
pub const DEFAULT_ARCH_ALIASES: &[&str] = &[
    "ARM64:aarch64,arm64",
    "X64:x86_64,x86-64,amd64,x64",
    "ARM32:aarch32,arm32,armv7,armhf",
    "X86:i386,i486,i586,i686,x86,x32",
];

/// One named entry and its lower-cased aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub name: String,
    pub aliases: Vec<String>,
}

impl AliasEntry {
    fn parse(line: &str) -> Option<Self> {
        let (name, rest) = match line.split_once(':') {
            Some((name, rest)) => (name.trim(), rest),
            None => (line.trim(), ""),
        };
        if name.is_empty() {
            return None;
        }

        let mut aliases = vec![name.to_lowercase()];
        aliases.extend(
            rest.split(',')
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty()),
        );
        Some(AliasEntry {
            name: name.to_string(),
            aliases,
        })
    }

    fn matches(&self, lowered: &str) -> bool {
        self.aliases.iter().any(|alias| lowered.contains(alias.as_str()))
    }
}

/// Ordered list of alias entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    /// Parse `NAME:alias,...` lines, skipping blank ones.
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Self {
        AliasTable {
            entries: lines
                .iter()
                .filter_map(|l| AliasEntry::parse(l.as_ref()))
                .collect(),
        }
    }

    /// Parse `lines`, or `defaults` when `lines` is empty.
    pub fn parse_or_default<S: AsRef<str>>(lines: &[S], defaults: &[&str]) -> Self {
        if lines.is_empty() {
            AliasTable::parse(defaults)
        } else {
            AliasTable::parse(lines)
        }
    }

    /// Canonical name of the first entry matching `evidence`.
    pub fn resolve(&self, evidence: &str) -> Option<&str> {
        let lowered = evidence.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.matches(&lowered))
            .map(|e| e.name.as_str())
    }

    /// Whether any entry matches `value`.
    pub fn matches(&self, value: &str) -> bool {
        self.resolve(value).is_some()
    }

    /// Concatenate two tables, `self` first.
    pub fn chain(mut self, other: &AliasTable) -> Self {
        self.entries.extend(other.entries.iter().cloned());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let table = AliasTable::parse(&["Temurin:adoptium,eclipse", "zulu", ""]);
        assert_eq!(table.resolve("Eclipse Adoptium"), Some("Temurin"));
        assert_eq!(table.resolve("zulu11.66.15-ca-jdk11"), Some("zulu"));
        assert_eq!(table.resolve("Oracle Corporation"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let table = AliasTable::parse(DEFAULT_ARCH_ALIASES);
        assert_eq!(table.resolve("jdk-21_linux-x64_bin"), Some("X64"));
        assert_eq!(table.resolve("amd64"), Some("X64"));
        assert_eq!(table.resolve("x86_64"), Some("X64"));
        assert_eq!(table.resolve("aarch64"), Some("ARM64"));
        assert_eq!(table.resolve("i386"), Some("X86"));
    }

    #[test]
    fn test_default_os_aliases() {
        let table = AliasTable::parse(DEFAULT_OS_ALIASES);
        assert_eq!(table.resolve("Mac OS X"), Some("MACOSX"));
        assert_eq!(table.resolve("darwin"), Some("MACOSX"));
        assert_eq!(table.resolve("Windows 11"), Some("WINDOWS"));
        assert_eq!(table.resolve("Linux"), Some("LINUX"));
    }

    #[test]
    fn test_parse_or_default() {
        let empty: [&str; 0] = [];
        let table = AliasTable::parse_or_default(&empty, DEFAULT_OS_ALIASES);
        assert!(!table.is_empty());

        let table = AliasTable::parse_or_default(&["LINUX:gnu"], DEFAULT_OS_ALIASES);
        assert_eq!(table.resolve("darwin"), None);
        assert_eq!(table.resolve("gnu"), Some("LINUX"));
    }
}
