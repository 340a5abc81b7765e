//! JSON wire format between the local driver and the in-image worker.
//!
//! Raw file bytes cross the wire base64-encoded so the whole exchange stays a
//! single UTF-8 JSON document on each side of the pipe.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    Check,
    Run,
}

impl JobMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JobMode::Check => "check",
            JobMode::Run => "run",
        }
    }
}

/// One job submission: the configuration document, every auxiliary file it
/// references, and the scalar run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub mode: JobMode,
    pub config_text: String,
    #[serde(with = "base64_map")]
    pub files: BTreeMap<String, Vec<u8>>,
    pub num_designs: u32,
}

/// One output file, keyed by its `/`-separated path relative to the tool's
/// output directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub path: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobResponse {
    Check {
        log: String,
        #[serde(with = "base64_bytes")]
        structure: Vec<u8>,
    },
    Run {
        outputs: Vec<OutputFile>,
    },
    Error {
        message: String,
        log: String,
    },
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(&encoded).map_err(D::Error::custom)
    }
}

mod base64_map {
    use std::collections::BTreeMap;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        files: &BTreeMap<String, Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let encoded: BTreeMap<&str, String> = files
            .iter()
            .map(|(path, data)| (path.as_str(), STANDARD.encode(data)))
            .collect();
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<u8>>, D::Error> {
        let encoded = BTreeMap::<String, String>::deserialize(deserializer)?;
        encoded
            .into_iter()
            .map(|(path, data)| Ok((path, STANDARD.decode(&data).map_err(D::Error::custom)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_through_json() {
        let mut files = BTreeMap::new();
        files.insert("foo/bar.cif".to_string(), vec![0u8, 159, 146, 150]);
        let request = JobRequest {
            mode: JobMode::Run,
            config_text: "entities: []\n".to_string(),
            files,
            num_designs: 4,
        };

        let json = serde_json::to_string(&request).unwrap();
        let decoded: JobRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn file_bytes_are_base64_strings_in_json() {
        let mut files = BTreeMap::new();
        files.insert("a.bin".to_string(), b"hello".to_vec());
        let request = JobRequest {
            mode: JobMode::Check,
            config_text: String::new(),
            files,
            num_designs: 1,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["mode"], "check");
        assert_eq!(json["files"]["a.bin"], "aGVsbG8=");
    }

    #[test]
    fn response_variants_are_tagged_by_status() {
        let response = JobResponse::Error {
            message: "boltzgen exited with status 1".to_string(),
            log: "traceback".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "boltzgen exited with status 1");

        let check = JobResponse::Check {
            log: "ok".to_string(),
            structure: b"data_2bit".to_vec(),
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "check");
        let decoded: JobResponse = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, check);
    }

    #[test]
    fn invalid_base64_is_a_deserialize_error() {
        let json = r#"{"mode":"check","config_text":"","files":{"a":"!!!"},"num_designs":1}"#;
        assert!(serde_json::from_str::<JobRequest>(json).is_err());
    }
}
