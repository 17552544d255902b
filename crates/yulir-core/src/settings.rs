//! Target configuration handed to the code generator and forwarded to every helper generator.

use crate::IrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum EvmVersion {
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    #[default]
    London,
}

impl EvmVersion {
    pub const ALL: [EvmVersion; 9] = [
        EvmVersion::Homestead,
        EvmVersion::TangerineWhistle,
        EvmVersion::SpuriousDragon,
        EvmVersion::Byzantium,
        EvmVersion::Constantinople,
        EvmVersion::Petersburg,
        EvmVersion::Istanbul,
        EvmVersion::Berlin,
        EvmVersion::London,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EvmVersion::Homestead => "homestead",
            EvmVersion::TangerineWhistle => "tangerineWhistle",
            EvmVersion::SpuriousDragon => "spuriousDragon",
            EvmVersion::Byzantium => "byzantium",
            EvmVersion::Constantinople => "constantinople",
            EvmVersion::Petersburg => "petersburg",
            EvmVersion::Istanbul => "istanbul",
            EvmVersion::Berlin => "berlin",
            EvmVersion::London => "london",
        }
    }

    pub fn supports_returndata(&self) -> bool {
        *self >= EvmVersion::Byzantium
    }

    pub fn has_static_call(&self) -> bool {
        *self >= EvmVersion::Byzantium
    }

    pub fn has_bitwise_shifting(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    pub fn has_create2(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    pub fn has_ext_code_hash(&self) -> bool {
        *self >= EvmVersion::Constantinople
    }

    pub fn has_chain_id(&self) -> bool {
        *self >= EvmVersion::Istanbul
    }

    pub fn has_self_balance(&self) -> bool {
        *self >= EvmVersion::Istanbul
    }

    pub fn has_base_fee(&self) -> bool {
        *self >= EvmVersion::London
    }
}

impl fmt::Display for EvmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvmVersion {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EvmVersion::ALL
            .iter()
            .copied()
            .find(|version| version.name() == s)
            .ok_or_else(|| IrError::UnknownEvmVersion(s.to_string()))
    }
}

/// How much revert-reason text generated code carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum RevertStrings {
    #[default]
    Default,
    Strip,
    Debug,
    VerboseDebug,
}

impl RevertStrings {
    pub fn name(&self) -> &'static str {
        match self {
            RevertStrings::Default => "default",
            RevertStrings::Strip => "strip",
            RevertStrings::Debug => "debug",
            RevertStrings::VerboseDebug => "verboseDebug",
        }
    }

    pub fn includes_debug_reasons(&self) -> bool {
        *self >= RevertStrings::Debug
    }
}

impl fmt::Display for RevertStrings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RevertStrings {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(RevertStrings::Default),
            "strip" => Ok(RevertStrings::Strip),
            "debug" => Ok(RevertStrings::Debug),
            "verboseDebug" => Ok(RevertStrings::VerboseDebug),
            other => Err(IrError::UnknownRevertStrings(other.to_string())),
        }
    }
}

/// Fixed per compilation unit. Helper generators receive exactly these values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodegenSettings {
    pub evm_version: EvmVersion,
    pub revert_strings: RevertStrings,
}

impl CodegenSettings {
    pub fn new(evm_version: EvmVersion, revert_strings: RevertStrings) -> Self {
        Self {
            evm_version,
            revert_strings,
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evm_version_names_round_trip_through_from_str() {
        for version in EvmVersion::ALL {
            assert_eq!(version.name().parse::<EvmVersion>().unwrap(), version);
        }
        assert!("shanghai".parse::<EvmVersion>().is_err());
    }

    #[test]
    fn test_shift_support_starts_at_constantinople() {
        assert!(!EvmVersion::Byzantium.has_bitwise_shifting());
        assert!(EvmVersion::Constantinople.has_bitwise_shifting());
        assert!(EvmVersion::London.has_bitwise_shifting());
    }

    #[test]
    fn test_settings_from_json_fills_defaults() {
        let settings =
            CodegenSettings::from_json(r#"{ "evmVersion": "byzantium" }"#).unwrap();
        assert_eq!(settings.evm_version, EvmVersion::Byzantium);
        assert_eq!(settings.revert_strings, RevertStrings::Default);

        let settings = CodegenSettings::from_json(r#"{ "revertStrings": "verboseDebug" }"#).unwrap();
        assert!(settings.revert_strings.includes_debug_reasons());
        assert_eq!(settings.evm_version, EvmVersion::London);
    }
}
