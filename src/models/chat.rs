use serde::{ Serialize, Deserialize };

/// One completed exchange: the question as typed and the model's answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub human: String,
    #[serde(rename = "AI")]
    pub assistant: String,
}

impl Turn {
    pub fn new(human: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self { human: human.into(), assistant: assistant.into() }
    }
}
