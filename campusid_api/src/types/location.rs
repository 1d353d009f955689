use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `/ph-location.json`: region code → region.
pub type LocationTree = BTreeMap<String, Region>;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Region {
    pub region_name: String,
    #[serde(default)]
    pub province_list: BTreeMap<String, Province>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Province {
    #[serde(default)]
    pub municipality_list: BTreeMap<String, Municipality>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Municipality {
    #[serde(default)]
    pub barangay_list: Vec<String>,
}

/// Row of `/table_province.json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProvinceRow {
    pub province_id: i64,
    pub region_id: i64,
    pub province_name: String,
}

/// Row of `/table_municipality.json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MunicipalityRow {
    pub municipality_id: i64,
    pub province_id: i64,
    pub municipality_name: String,
}

/// Row of `/table_barangay.json`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BarangayRow {
    pub barangay_id: i64,
    pub municipality_id: i64,
    pub barangay_name: String,
}
