use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct EndpointStat {
    pub method: String,
    pub endpoint: String,
    pub count: i32,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ApiUsage {
    pub first_name: String,
    pub email: String,
    pub total_api_calls: i32,
}
