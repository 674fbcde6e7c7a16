use serde::{ Serialize, Deserialize };

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// `model` and `memory_length` carry the UI controls' current state;
    /// when absent the server defaults apply.
    #[serde(rename = "chat")] Chat {
        content: String,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        memory_length: Option<usize>,
    },
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "ready")] Ready {
        session_id: String,
        default_model: String,
        memory_length: usize,
    },
    #[serde(rename = "response")] Response {
        content: String,
        timestamp: i64,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
    #[serde(rename = "processing")]
    Processing,
}
