//! Version-dependent dtype gating.
//!
//! Some source-API releases reject particular dtypes for particular ops. A
//! [`DtypeGate`] records those rules as `op -> [(version range, dtypes)]` and
//! is consulted at the [`Frontend`](crate::Frontend) boundary before an entry
//! runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use torchbridge_core::DType;

use crate::error::{FrontendError, Result};

/// A `major.minor.patch` release number of the source API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TorchVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl TorchVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for TorchVersion {
    fn default() -> Self {
        Self::new(2, 0, 0)
    }
}

impl fmt::Display for TorchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for TorchVersion {
    type Err = FrontendError;

    /// Accepts `X.Y.Z` or `X.Y`; local suffixes such as `+cpu` are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let core = s.trim().split('+').next().unwrap_or_default();
        let parts = core
            .split('.')
            .map(|p| p.parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| FrontendError::config(format!("invalid torch version '{s}'")))?;
        match parts[..] {
            [major, minor] => Ok(Self::new(major, minor, 0)),
            [major, minor, patch] => Ok(Self::new(major, minor, patch)),
            _ => Err(FrontendError::config(format!("invalid torch version '{s}'"))),
        }
    }
}

/// The set of releases a gate rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSpec {
    /// `"X.Y.Z"`
    Exactly(TorchVersion),
    /// `"X.Y.Z and below"`
    AndBelow(TorchVersion),
    /// `"X.Y.Z and above"`
    AndAbove(TorchVersion),
    /// `"X.Y.Z to A.B.C"`, both ends inclusive.
    Between(TorchVersion, TorchVersion),
}

impl VersionSpec {
    pub fn contains(&self, version: TorchVersion) -> bool {
        match *self {
            Self::Exactly(v) => version == v,
            Self::AndBelow(v) => version <= v,
            Self::AndAbove(v) => version >= v,
            Self::Between(lo, hi) => lo <= version && version <= hi,
        }
    }
}

impl FromStr for VersionSpec {
    type Err = FrontendError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(v) = s.strip_suffix("and below") {
            return Ok(Self::AndBelow(v.parse()?));
        }
        if let Some(v) = s.strip_suffix("and above") {
            return Ok(Self::AndAbove(v.parse()?));
        }
        if let Some((lo, hi)) = s.split_once(" to ") {
            let (lo, hi) = (lo.parse()?, hi.parse()?);
            if lo > hi {
                return Err(FrontendError::config(format!(
                    "version range '{s}' is empty"
                )));
            }
            return Ok(Self::Between(lo, hi));
        }
        Ok(Self::Exactly(s.parse()?))
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(v) => write!(f, "{v}"),
            Self::AndBelow(v) => write!(f, "{v} and below"),
            Self::AndAbove(v) => write!(f, "{v} and above"),
            Self::Between(lo, hi) => write!(f, "{lo} to {hi}"),
        }
    }
}

/// Per-op table of dtypes that given releases do not support.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DtypeGate {
    rules: BTreeMap<String, Vec<(VersionSpec, BTreeSet<DType>)>>,
}

impl DtypeGate {
    /// An empty table that allows everything.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// The rules shipped with the catalogue.
    pub fn torch_defaults() -> Self {
        let mut gate = Self::default();
        let below_1_11 = VersionSpec::AndBelow(TorchVersion::new(1, 11, 0));
        gate.add_rule("cumsum", below_1_11, [DType::U8, DType::BF16, DType::F16]);
        gate.add_rule("cumsum", VersionSpec::Exactly(TorchVersion::new(1, 12, 1)), Vec::new());
        gate.add_rule("trace", below_1_11, [DType::F16, DType::BF16]);
        gate.add_rule("lcm", below_1_11, [DType::I8]);
        gate
    }

    /// Record that releases matching `spec` reject `dtypes` for `op`.
    pub fn add_rule(
        &mut self,
        op: impl Into<String>,
        spec: VersionSpec,
        dtypes: impl IntoIterator<Item = DType>,
    ) -> &mut Self {
        self.rules
            .entry(op.into())
            .or_default()
            .push((spec, dtypes.into_iter().collect()));
        self
    }

    /// Parse a table of the form
    /// `{"op": {"<version spec>": ["dtype", ...]}}`.
    ///
    /// ```
    /// # use torchbridge_frontend::gate::{DtypeGate, TorchVersion};
    /// # use torchbridge_core::DType;
    /// let gate = DtypeGate::from_json(r#"{"cumsum": {"1.11.0 and below": ["uint8"]}}"#).unwrap();
    /// assert!(gate.check("cumsum", TorchVersion::new(1, 10, 0), DType::U8).is_err());
    /// assert!(gate.check("cumsum", TorchVersion::new(2, 0, 0), DType::U8).is_ok());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, Vec<DType>>> = serde_json::from_str(json)
            .map_err(|e| FrontendError::config(format!("malformed dtype gate table: {e}")))?;
        let mut gate = Self::default();
        for (op, specs) in raw {
            for (spec, dtypes) in specs {
                gate.add_rule(op.clone(), spec.parse()?, dtypes);
            }
        }
        Ok(gate)
    }

    /// Dtypes that `op` rejects under `version`.
    pub fn unsupported(&self, op: &str, version: TorchVersion) -> BTreeSet<DType> {
        self.rules
            .get(op)
            .into_iter()
            .flatten()
            .filter(|(spec, _)| spec.contains(version))
            .flat_map(|(_, dtypes)| dtypes.iter().copied())
            .collect()
    }

    /// Fail with [`FrontendError::UnsupportedDtype`] when `dtype` is gated
    /// out for `op` under `version`.
    pub fn check(&self, op: &'static str, version: TorchVersion, dtype: DType) -> Result<()> {
        if self.unsupported(op, version).contains(&dtype) {
            return Err(FrontendError::UnsupportedDtype { op, dtype, version });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        assert_eq!("1.12.1".parse::<TorchVersion>().unwrap(), TorchVersion::new(1, 12, 1));
        assert_eq!("2.1".parse::<TorchVersion>().unwrap(), TorchVersion::new(2, 1, 0));
        assert_eq!("2.0.1+cpu".parse::<TorchVersion>().unwrap(), TorchVersion::new(2, 0, 1));
        assert!("two".parse::<TorchVersion>().is_err());
        assert!("1".parse::<TorchVersion>().is_err());
        assert!("1.2.3.4".parse::<TorchVersion>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        assert!(TorchVersion::new(1, 9, 0) < TorchVersion::new(1, 11, 0));
        assert!(TorchVersion::new(1, 11, 0) < TorchVersion::new(2, 0, 0));
    }

    #[test]
    fn test_parse_spec() {
        let v = TorchVersion::new(1, 11, 0);
        assert_eq!("1.11.0 and below".parse::<VersionSpec>().unwrap(), VersionSpec::AndBelow(v));
        assert_eq!("1.11.0 and above".parse::<VersionSpec>().unwrap(), VersionSpec::AndAbove(v));
        assert_eq!("1.11.0".parse::<VersionSpec>().unwrap(), VersionSpec::Exactly(v));
        let range = "1.9.0 to 1.11.0".parse::<VersionSpec>().unwrap();
        assert!(range.contains(TorchVersion::new(1, 10, 2)));
        assert!(!range.contains(TorchVersion::new(1, 12, 0)));
        assert!("1.11.0 to 1.9.0".parse::<VersionSpec>().is_err());
        assert_eq!(range.to_string(), "1.9.0 to 1.11.0");
    }

    #[test]
    fn test_defaults_follow_release_table() {
        let gate = DtypeGate::torch_defaults();
        let old = TorchVersion::new(1, 11, 0);
        let new = TorchVersion::new(2, 0, 0);
        assert!(gate.check("cumsum", old, DType::U8).is_err());
        assert!(gate.check("cumsum", old, DType::F16).is_err());
        assert!(gate.check("cumsum", old, DType::F32).is_ok());
        assert!(gate.check("cumsum", TorchVersion::new(1, 12, 1), DType::U8).is_ok());
        assert!(gate.check("cumsum", new, DType::U8).is_ok());
        assert!(gate.check("trace", old, DType::BF16).is_err());
        assert!(gate.check("lcm", old, DType::I8).is_err());
        assert!(gate.check("lcm", new, DType::I8).is_ok());
        assert!(gate.check("flip", old, DType::U8).is_ok());
    }

    #[test]
    fn test_from_json() {
        let gate = DtypeGate::from_json(
            r#"{"trace": {"1.11.0 and below": ["float16", "bfloat16"]},
                "lcm": {"1.11.0 and below": ["int8"]}}"#,
        )
        .unwrap();
        let old = TorchVersion::new(1, 8, 0);
        assert_eq!(
            gate.unsupported("trace", old),
            BTreeSet::from([DType::F16, DType::BF16])
        );
        assert!(gate.check("lcm", old, DType::I8).is_err());
    }

    #[test]
    fn test_from_json_rejects_bad_tables() {
        assert!(DtypeGate::from_json("[]").is_err());
        assert!(DtypeGate::from_json(r#"{"lcm": {"soon": ["int8"]}}"#).is_err());
        assert!(DtypeGate::from_json(r#"{"lcm": {"1.0.0": ["complex64"]}}"#).is_err());
    }
}
