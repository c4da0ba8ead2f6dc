use serde::{Deserialize, Serialize};

// Requests

#[derive(Debug, Serialize, Clone)]
pub struct InsertJobRequest {
    pub configuration: JobConfiguration,
}

#[derive(Debug, Serialize, Clone)]
pub struct JobConfiguration {
    pub load: LoadConfiguration,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoadConfiguration {
    pub source_uris: Vec<String>,
    pub source_format: String, // "NEWLINE_DELIMITED_JSON"
    pub autodetect: bool,
    pub write_disposition: String, // "WRITE_TRUNCATE" replaces the table contents
    pub destination_table: TableReference,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

// Responses

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_reference: JobReference,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub state: String, // "PENDING", "RUNNING" or "DONE"
    pub error_result: Option<ErrorProto>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ErrorProto {
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl JobStatus {
    pub fn is_done(&self) -> bool {
        self.state == "DONE"
    }
}
