//! Request/response DTOs for the REST API.

pub mod booking_dto;
pub mod group_dto;
pub mod slot_dto;

pub(crate) mod time_hm {
    //! Serde adapter for wall-clock times as HTML time inputs submit them:
    //! `"HH:MM"`, with `"HH:MM:SS"` accepted on input.

    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FMT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FMT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(&raw, FMT))
            .map_err(serde::de::Error::custom)
    }
}
