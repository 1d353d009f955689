use std::collections::{BTreeMap, HashMap};

use campusid_api::types::{BarangayRow, LocationTree, MunicipalityRow, ProvinceRow};

#[derive(Debug, Clone, Default, PartialEq)]
struct ProvinceEntry {
    region: String,
    cities: BTreeMap<String, Vec<String>>,
}

/// Province → city/municipality → barangay lookup, keyed by display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationDirectory {
    provinces: BTreeMap<String, ProvinceEntry>,
}

impl LocationDirectory {
    /// Flattens the nested `/ph-location.json` tree; regions only survive as
    /// the `region_of` attribute of each province.
    pub fn from_tree(tree: &LocationTree) -> Self {
        let mut provinces = BTreeMap::new();
        for region in tree.values() {
            for (province_name, province) in &region.province_list {
                let cities = province
                    .municipality_list
                    .iter()
                    .map(|(name, m)| (name.clone(), m.barangay_list.clone()))
                    .collect();
                provinces.insert(
                    province_name.clone(),
                    ProvinceEntry {
                        region: region.region_name.clone(),
                        cities,
                    },
                );
            }
        }
        Self { provinces }
    }

    /// Joins the three flat tables on their numeric IDs. Rows pointing at an
    /// unknown parent are dropped.
    pub fn from_tables(
        provinces: &[ProvinceRow],
        municipalities: &[MunicipalityRow],
        barangays: &[BarangayRow],
    ) -> Self {
        let mut barangays_by_municipality: HashMap<i64, Vec<String>> = HashMap::new();
        for row in barangays {
            barangays_by_municipality
                .entry(row.municipality_id)
                .or_default()
                .push(row.barangay_name.clone());
        }

        let mut cities_by_province: HashMap<i64, BTreeMap<String, Vec<String>>> = HashMap::new();
        for row in municipalities {
            let barangays = barangays_by_municipality
                .remove(&row.municipality_id)
                .unwrap_or_default();
            cities_by_province
                .entry(row.province_id)
                .or_default()
                .insert(row.municipality_name.clone(), barangays);
        }

        let provinces = provinces
            .iter()
            .map(|row| {
                (
                    row.province_name.clone(),
                    ProvinceEntry {
                        region: row.region_id.to_string(),
                        cities: cities_by_province
                            .remove(&row.province_id)
                            .unwrap_or_default(),
                    },
                )
            })
            .collect();

        let orphan_cities: usize = cities_by_province.values().map(BTreeMap::len).sum();
        let orphan_barangays: usize = barangays_by_municipality.values().map(Vec::len).sum();
        if orphan_cities > 0 || orphan_barangays > 0 {
            tracing::warn!(
                "Dropped {} municipalities and {} barangays with no matching parent row",
                orphan_cities,
                orphan_barangays
            );
        }
        Self { provinces }
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }

    /// Province names in alphabetical order.
    pub fn provinces(&self) -> Vec<&str> {
        self.provinces.keys().map(String::as_str).collect()
    }

    pub fn region_of(&self, province: &str) -> Option<&str> {
        self.provinces.get(province).map(|p| p.region.as_str())
    }

    /// Cities/municipalities of a province, or `None` for an unknown province.
    pub fn cities(&self, province: &str) -> Option<Vec<&str>> {
        self.provinces
            .get(province)
            .map(|p| p.cities.keys().map(String::as_str).collect())
    }

    /// Barangays of a city in source order, or `None` when either level is unknown.
    pub fn barangays(&self, province: &str, city: &str) -> Option<&[String]> {
        self.provinces
            .get(province)?
            .cities
            .get(city)
            .map(Vec::as_slice)
    }
}
