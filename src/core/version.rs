//! Version & dependency algebra.
//!
//! A [`Version`] is a finite ordered sequence of non-negative integers;
//! comparison is lexicographic, and a longer sequence outranks its own
//! prefix (`1.2.0` > `1.2`). A [`Dependency`] pairs a package name with a
//! [`Relation`] and a required [`Version`]; [`satisfies`] decides whether an
//! installed version meets that requirement, and [`check_all`] walks an
//! entire installed set looking for unmet dependencies.
//!
//! Everything here is total and does no I/O: callers hand in already-read
//! strings and already-assembled views of the installed set.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

/// A parsed, comparable version: a non-empty sequence of non-negative
/// integers parsed from dot-separated decimal tokens.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(Vec<u64>);

/// One of the five constraint relations a [`Dependency`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

/// A single dependency requirement: `name` must be installed at a version
/// satisfying `relation` against `version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub name: String,
    pub relation: Relation,
    pub version: Version,
}

/// A read-only view of one package's installed version and dependencies,
/// as fed into [`check_all`]. Borrowed rather than owned so the install and
/// uninstall coordinators can build their merged views of the installed set
/// without cloning the whole catalog.
#[derive(Debug, Clone)]
pub struct PackageView {
    pub version: Version,
    pub deps: Vec<Dependency>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("version string is empty")]
    EmptyVersion,
    #[error("empty version component in {0:?}")]
    EmptyToken(String),
    #[error("non-numeric version component {0:?} in {1:?}")]
    InvalidToken(String, String),
    #[error("missing package name in dependency token {0:?}")]
    EmptyName(String),
    #[error("missing version after operator in dependency token {0:?}")]
    EmptyOperand(String),
}

/// All per-token parse failures accumulated by [`parse_deps`], preserving
/// the order the offending tokens appeared in.
#[derive(Debug, Error)]
#[error("{} invalid dependency token(s)", errors.len())]
pub struct AggregateParseError {
    pub errors: Vec<ParseError>,
}

impl Version {
    /// Parses a version string: tokens split on `.`, each a non-negative
    /// integer. Empty tokens (`"1..2"`) and non-numeric tokens (`"1.6.3a"`,
    /// `"1.2.-5"`) are rejected.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() {
            return Err(ParseError::EmptyVersion);
        }
        let mut parts = Vec::new();
        for token in s.split('.') {
            if token.is_empty() {
                return Err(ParseError::EmptyToken(s.to_string()));
            }
            let n: u64 = token
                .parse()
                .map_err(|_| ParseError::InvalidToken(token.to_string(), s.to_string()))?;
            parts.push(n);
        }
        Ok(Self(parts))
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        f.write_str(&rendered)
    }
}

/// Lexicographic comparison per the sequence ordering in the data model:
/// returns `-1`, `0`, or `1`. A longer sequence is greater than its prefix,
/// which falls out of `Vec<u64>`'s derived `Ord`.
pub fn compare(a: &Version, b: &Version) -> i32 {
    match a.cmp(b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Decides whether `existing` (an installed version) satisfies a
/// requirement of `required` under `rel`.
///
/// `required=0.1.0, existing=2.5, rel=Ge` reads "the installed package must
/// be at least 0.1.0" and is satisfied: `compare(required, existing)` is
/// `-1` (existing is newer), and the `-1` row permits `Ge`/`Gt`.
pub fn satisfies(required: &Version, existing: &Version, rel: Relation) -> bool {
    match compare(required, existing) {
        0 => matches!(rel, Relation::Eq | Relation::Ge | Relation::Le),
        1 => matches!(rel, Relation::Le | Relation::Lt),
        -1 => matches!(rel, Relation::Ge | Relation::Gt),
        _ => unreachable!("i32 cmp result is always -1, 0, or 1"),
    }
}

/// Parses one dependency token: `name@1.2.3`, `name>=1.0`, `name<2`, or a
/// bare `name` (equivalent to `name>0`).
///
/// Scans for the earliest occurrence of an operator-leading character
/// (`@`, `=`, `>`, `<`); `>`/`<` each consume a following `=` if present.
pub fn parse_dep(token: &str) -> Result<Dependency, ParseError> {
    let Some(op_start) = token.find(['@', '=', '>', '<']) else {
        if token.is_empty() {
            return Err(ParseError::EmptyName(token.to_string()));
        }
        return Ok(Dependency {
            name: token.to_string(),
            relation: Relation::Gt,
            version: Version(vec![0]),
        });
    };

    let name = &token[..op_start];
    if name.is_empty() {
        return Err(ParseError::EmptyName(token.to_string()));
    }

    let rest = &token[op_start..];
    let (relation, operand) = match rest.as_bytes()[0] {
        b'@' | b'=' => (Relation::Eq, &rest[1..]),
        b'>' if rest.as_bytes().get(1) == Some(&b'=') => (Relation::Ge, &rest[2..]),
        b'<' if rest.as_bytes().get(1) == Some(&b'=') => (Relation::Le, &rest[2..]),
        b'>' => (Relation::Gt, &rest[1..]),
        b'<' => (Relation::Lt, &rest[1..]),
        _ => unreachable!("op_start always points at one of @=><"),
    };

    if operand.is_empty() {
        return Err(ParseError::EmptyOperand(token.to_string()));
    }

    let version =
        Version::parse(operand).map_err(|_| ParseError::EmptyOperand(token.to_string()))?;

    Ok(Dependency {
        name: name.to_string(),
        relation,
        version,
    })
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::Eq => "@",
            Relation::Gt => ">",
            Relation::Ge => ">=",
            Relation::Lt => "<",
            Relation::Le => "<=",
        };
        f.write_str(s)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.relation, self.version)
    }
}

/// Parses a whitespace-separated dependency string, accumulating every
/// per-token failure instead of stopping at the first one.
pub fn parse_deps(s: &str) -> Result<Vec<Dependency>, AggregateParseError> {
    let mut deps = Vec::new();
    let mut errors = Vec::new();

    for token in s.split_whitespace() {
        match parse_dep(token) {
            Ok(dep) => deps.push(dep),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(deps)
    } else {
        Err(AggregateParseError { errors })
    }
}

/// Walks `packages` looking for dependencies that are unmet: the named
/// dependency is absent from `packages`, or present but `satisfies` rejects
/// its installed version. Yield order follows iteration order over
/// `packages` and over each package's `deps`; callers control that order
/// by the order they build the slice in (see the install and uninstall
/// coordinators' merged-view helpers).
///
/// Per-edge only: a dependency cycle (`a` needs `b`, `b` needs `a`) is not
/// itself a failure as long as each edge's version constraint is satisfied.
pub fn check_all(packages: &[(String, PackageView)]) -> impl Iterator<Item = (String, Dependency)> + '_ {
    packages.iter().flat_map(move |(name, view)| {
        view.deps.iter().filter_map(move |dep| {
            let ok = packages
                .iter()
                .find(|(n, _)| *n == dep.name)
                .is_some_and(|(_, v)| satisfies(&dep.version, &v.version, dep.relation));
            if ok {
                None
            } else {
                Some((name.clone(), dep.clone()))
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_versions() {
        assert_eq!(Version::parse("1.2.3").unwrap().components(), &[1, 2, 3]);
        assert_eq!(Version::parse("0").unwrap().components(), &[0]);
        assert_eq!(
            Version::parse("0.243.1.52034.2142").unwrap().components(),
            &[0, 243, 1, 52034, 2142]
        );
    }

    #[test]
    fn rejects_malformed_versions() {
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("1.6.3a").is_err());
        assert!(Version::parse("1.2.-5").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn compare_is_antisymmetric_and_reflexive() {
        let v1 = Version::parse("1.2.0").unwrap();
        let v2 = Version::parse("1.2").unwrap();
        assert_eq!(compare(&v1, &v2), -compare(&v2, &v1));
        assert_eq!(compare(&v1, &v1), 0);
        // A longer sequence outranks its own prefix.
        assert_eq!(compare(&v1, &v2), 1);
    }

    #[test]
    fn parses_dependency_operators() {
        let d = parse_dep("b>=0.1.0").unwrap();
        assert_eq!(d.name, "b");
        assert!(matches!(d.relation, Relation::Ge));
        assert_eq!(d.version.components(), &[0, 1, 0]);

        let d = parse_dep("c@2.1.0").unwrap();
        assert!(matches!(d.relation, Relation::Eq));

        let d = parse_dep("c=2.1.0").unwrap();
        assert!(matches!(d.relation, Relation::Eq));

        let d = parse_dep("d<1.0.0").unwrap();
        assert!(matches!(d.relation, Relation::Lt));

        let d = parse_dep("e<=1.0.0").unwrap();
        assert!(matches!(d.relation, Relation::Le));

        let d = parse_dep("bare").unwrap();
        assert!(matches!(d.relation, Relation::Gt));
        assert_eq!(d.version.components(), &[0]);
    }

    #[test]
    fn rejects_malformed_dependencies() {
        assert!(parse_dep("@1.0").is_err());
        assert!(parse_dep("name@").is_err());
        assert!(parse_dep("name>=").is_err());
    }

    #[test]
    fn parse_deps_aggregates_errors() {
        let err = parse_deps("ok>=1.0 @bad another>bad.version").unwrap_err();
        assert_eq!(err.errors.len(), 2);
    }

    #[test]
    fn parse_deps_round_trips_through_format() {
        let original = parse_deps("a>=1.0.0 b@2.0 bare").unwrap();
        let formatted = original
            .iter()
            .map(Dependency::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let reparsed = parse_deps(&formatted).unwrap();
        assert_eq!(original, reparsed);
    }

    #[test]
    fn satisfies_matches_the_relation_table() {
        let req = Version::parse("0.1.0").unwrap();
        let existing = Version::parse("2.5").unwrap();
        assert_eq!(compare(&req, &existing), -1);
        assert!(satisfies(&req, &existing, Relation::Ge));
        assert!(!satisfies(&req, &existing, Relation::Le));
    }

    #[test]
    fn check_all_reports_single_unmet_dependency_among_three_packages() {
        // A=1.2.0 deps b>=0.1.0 c@2.1.0; B=2.5 deps c<1.0.0; C=0.9 deps a@1.2.0
        let packages = vec![
            (
                "a".to_string(),
                PackageView {
                    version: Version::parse("1.2.0").unwrap(),
                    deps: parse_deps("b>=0.1.0 c@2.1.0").unwrap(),
                },
            ),
            (
                "b".to_string(),
                PackageView {
                    version: Version::parse("2.5").unwrap(),
                    deps: parse_deps("c<1.0.0").unwrap(),
                },
            ),
            (
                "c".to_string(),
                PackageView {
                    version: Version::parse("0.9").unwrap(),
                    deps: parse_deps("a@1.2.0").unwrap(),
                },
            ),
        ];

        let failures: Vec<_> = check_all(&packages).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "a");
        assert_eq!(failures[0].1.name, "c");
    }

    #[test]
    fn check_all_accepts_cycles() {
        // a@1 deps b@1; b@1 deps a@1: accepted, no cycle detection.
        let packages = vec![
            (
                "a".to_string(),
                PackageView {
                    version: Version::parse("1").unwrap(),
                    deps: parse_deps("b@1").unwrap(),
                },
            ),
            (
                "b".to_string(),
                PackageView {
                    version: Version::parse("1").unwrap(),
                    deps: parse_deps("a@1").unwrap(),
                },
            ),
        ];
        assert_eq!(check_all(&packages).count(), 0);
    }

    #[test]
    fn check_all_reports_missing_dependency() {
        let packages = vec![(
            "a".to_string(),
            PackageView {
                version: Version::parse("1").unwrap(),
                deps: parse_deps("missing@1").unwrap(),
            },
        )];
        let failures: Vec<_> = check_all(&packages).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1.name, "missing");
    }
}
