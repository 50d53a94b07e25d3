//! DNS-JSON wire model.
//!
//! Both default DoH endpoints speak the same JSON reply dialect: a numeric
//! `Status` (0 = success) and an `Answer` array whose `data` fields carry
//! the record values in response order. Fields the engine does not consume
//! are left out of the model; serde ignores them.

use serde::Deserialize;

/// A DoH JSON reply, reduced to the fields the engine reads.
#[derive(Debug, Deserialize)]
pub struct DnsJsonReply {
    /// DNS response code; 0 means the query succeeded
    #[serde(rename = "Status")]
    pub status: u16,

    /// Answer records; absent on failures and empty non-answers
    #[serde(rename = "Answer", default)]
    pub answer: Vec<DnsJsonAnswer>,
}

/// One answer record of a DoH JSON reply.
#[derive(Debug, Deserialize)]
pub struct DnsJsonAnswer {
    /// Owner name the record answers for
    #[allow(dead_code)] // Part of the wire record; not consumed yet
    pub name: String,

    /// Numeric record type
    #[serde(rename = "type")]
    #[allow(dead_code)] // Part of the wire record; not consumed yet
    pub record_type: u16,

    /// Remaining time-to-live in seconds
    #[serde(rename = "TTL", default)]
    #[allow(dead_code)] // Part of the wire record; not consumed yet
    pub ttl: u32,

    /// Record data (address, target name, text, ...)
    pub data: String,
}

impl DnsJsonReply {
    /// Extracts the answer data strings in response order.
    pub fn answer_data(self) -> Vec<String> {
        self.answer.into_iter().map(|record| record.data).collect()
    }
}

/// Parses a DoH JSON reply body.
pub fn parse_reply(body: &str) -> Result<DnsJsonReply, serde_json::Error> {
    serde_json::from_str(body)
}
