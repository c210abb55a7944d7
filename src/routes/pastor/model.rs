use serde::Deserialize;

use crate::stats::Timeframe;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCelulaRequest {
    pub name: String,
    pub lider_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiderRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub celula_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EstadisticasQuery {
    #[serde(default)]
    pub timeframe: Timeframe,
}
