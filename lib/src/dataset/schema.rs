//! Column layout of the King County house-sales data.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Predictor columns, in the order the transformer emits them.
pub const HOUSE_FEATURES: [&str; 20] = [
    "bedrooms",
    "bathrooms",
    "sqft_living",
    "sqft_lot",
    "floors",
    "waterfront",
    "view",
    "condition",
    "grade",
    "sqft_above",
    "sqft_basement",
    "yr_built",
    "yr_renovated",
    "lat",
    "long",
    "sqft_living15",
    "sqft_lot15",
    "year",
    "month",
    "house_age",
];

/// Column holding the sale price.
pub const TARGET_COLUMN: &str = "price";

/// One house to price, as entered on the prediction form.
///
/// `house_age` may be omitted; it is then derived as `year - yr_built`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HouseFeatures {
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub sqft_living: f64,
    pub sqft_lot: f64,
    pub floors: f64,
    pub waterfront: f64,
    pub view: f64,
    pub condition: f64,
    pub grade: f64,
    pub sqft_above: f64,
    pub sqft_basement: f64,
    pub yr_built: f64,
    pub yr_renovated: f64,
    pub lat: f64,
    pub long: f64,
    pub sqft_living15: f64,
    pub sqft_lot15: f64,
    /// Year of sale.
    pub year: f64,
    /// Month of sale.
    pub month: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_age: Option<f64>,
}

impl HouseFeatures {
    pub fn house_age(&self) -> f64 {
        self.house_age.unwrap_or(self.year - self.yr_built)
    }

    /// Values in [`HOUSE_FEATURES`] order.
    pub fn to_row(&self) -> [f64; 20] {
        [
            self.bedrooms,
            self.bathrooms,
            self.sqft_living,
            self.sqft_lot,
            self.floors,
            self.waterfront,
            self.view,
            self.condition,
            self.grade,
            self.sqft_above,
            self.sqft_basement,
            self.yr_built,
            self.yr_renovated,
            self.lat,
            self.long,
            self.sqft_living15,
            self.sqft_lot15,
            self.year,
            self.month,
            self.house_age(),
        ]
    }

    /// Stacks houses into a matrix with one row per house.
    pub fn to_matrix(houses: &[HouseFeatures]) -> Array2<f64> {
        let mut matrix = Array2::zeros((houses.len(), HOUSE_FEATURES.len()));
        for (mut row, house) in matrix.rows_mut().into_iter().zip(houses) {
            row.assign(&ArrayView1::from(&house.to_row()));
        }
        matrix
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::table::FeatureTable;
    use std::ops::Range;

    /// A deterministic synthetic house; `price_of` gives its exact price.
    ///
    /// Each column cycles with its own stride and modulus so that no column is
    /// a linear function of the row index over a short range of rows.
    pub(crate) fn synthetic_house(i: usize) -> HouseFeatures {
        let sqft_living = 900.0 + ((i * 379) % 2591) as f64;
        let sqft_basement = ((i / 2 % 4) * 100) as f64;
        HouseFeatures {
            bedrooms: (1 + (i * 7) % 5) as f64,
            bathrooms: 1.0 + ((i * 5) % 7) as f64 * 0.25,
            sqft_living,
            sqft_lot: (4000 + (i * 613) % 5987) as f64,
            floors: (1 + i / 3 % 3) as f64,
            waterfront: if i % 17 == 0 { 1.0 } else { 0.0 },
            view: ((i * 3) % 5) as f64,
            condition: (3 + i / 2 % 3) as f64,
            grade: (5 + (i * 7) % 6) as f64,
            sqft_above: sqft_living - sqft_basement,
            sqft_basement,
            yr_built: (1950 + (i * 17) % 61) as f64,
            yr_renovated: if i % 9 == 0 { 2005.0 } else { 0.0 },
            lat: 47.5 + ((i * 13) % 23) as f64 * 0.005,
            long: -122.3 + ((i * 5) % 19) as f64 * 0.01,
            sqft_living15: (1200 + (i * 211) % 1499) as f64,
            sqft_lot15: (5000 + (i * 137) % 2999) as f64,
            year: (2014 + i / 5 % 2) as f64,
            month: (1 + (i * 5) % 12) as f64,
            house_age: None,
        }
    }

    pub(crate) fn price_of(house: &HouseFeatures) -> f64 {
        150.0 * house.sqft_living + 20_000.0 * house.grade + 50_000.0
    }

    /// A sales table over `rows`, with an extra `id` column and the `price` target.
    pub(crate) fn house_sales_table(rows: Range<usize>) -> FeatureTable {
        let houses: Vec<HouseFeatures> = rows.clone().map(synthetic_house).collect();
        let mut columns: Vec<(String, Vec<f64>)> =
            vec![("id".to_string(), rows.map(|i| i as f64).collect())];
        for (j, name) in HOUSE_FEATURES.iter().enumerate() {
            columns.push((name.to_string(), houses.iter().map(|h| h.to_row()[j]).collect()));
        }
        columns.push((TARGET_COLUMN.to_string(), houses.iter().map(price_of).collect()));
        FeatureTable::from_columns(columns).unwrap()
    }

    pub(crate) fn sample_house() -> HouseFeatures {
        HouseFeatures {
            bedrooms: 3.0,
            bathrooms: 2.25,
            sqft_living: 2570.0,
            sqft_lot: 7242.0,
            floors: 2.0,
            waterfront: 0.0,
            view: 0.0,
            condition: 3.0,
            grade: 7.0,
            sqft_above: 2170.0,
            sqft_basement: 400.0,
            yr_built: 1951.0,
            yr_renovated: 1991.0,
            lat: 47.721,
            long: -122.319,
            sqft_living15: 1690.0,
            sqft_lot15: 7639.0,
            year: 2014.0,
            month: 12.0,
            house_age: None,
        }
    }

    #[test]
    fn test_house_age_is_derived_when_absent() {
        let house = sample_house();
        assert_eq!(house.house_age(), 63.0);
        assert_eq!(house.to_row()[19], 63.0);

        let explicit = HouseFeatures {
            house_age: Some(10.0),
            ..sample_house()
        };
        assert_eq!(explicit.house_age(), 10.0);
    }

    #[test]
    fn test_row_follows_feature_order() {
        let row = sample_house().to_row();
        let sqft_living = HOUSE_FEATURES
            .iter()
            .position(|&f| f == "sqft_living")
            .unwrap();
        assert_eq!(row[sqft_living], 2570.0);
        assert_eq!(row[HOUSE_FEATURES.len() - 2], 12.0);
    }

    #[test]
    fn test_deserialize_without_house_age() {
        let json = r#"{
            "bedrooms": 3, "bathrooms": 1, "sqft_living": 1180, "sqft_lot": 5650,
            "floors": 1, "waterfront": 0, "view": 0, "condition": 3, "grade": 7,
            "sqft_above": 1180, "sqft_basement": 0, "yr_built": 1955, "yr_renovated": 0,
            "lat": 47.5112, "long": -122.257, "sqft_living15": 1340, "sqft_lot15": 5650,
            "year": 2014, "month": 10
        }"#;
        let house: HouseFeatures = serde_json::from_str(json).unwrap();
        assert_eq!(house.house_age, None);
        assert_eq!(house.house_age(), 59.0);
    }

    #[test]
    fn test_synthetic_columns_are_not_linear_in_row_index() {
        let rows = 0..60;
        let index: Vec<f64> = rows.clone().map(|i| i as f64).collect();
        let houses: Vec<HouseFeatures> = rows.map(synthetic_house).collect();
        let correlation = |a: &[f64], b: &[f64]| {
            let n = a.len() as f64;
            let (ma, mb) = (a.iter().sum::<f64>() / n, b.iter().sum::<f64>() / n);
            let cov: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
            let va: f64 = a.iter().map(|x| (x - ma).powi(2)).sum();
            let vb: f64 = b.iter().map(|y| (y - mb).powi(2)).sum();
            cov / (va * vb).sqrt()
        };

        for name in ["sqft_living", "sqft_lot", "sqft_living15", "sqft_lot15", "yr_built"] {
            let j = HOUSE_FEATURES.iter().position(|&f| f == name).unwrap();
            let column: Vec<f64> = houses.iter().map(|h| h.to_row()[j]).collect();
            let r = correlation(&column, &index);
            assert!(r.abs() < 0.9, "{name} tracks the row index (r = {r})");
        }
    }

    #[test]
    fn test_to_matrix() {
        let matrix = HouseFeatures::to_matrix(&[sample_house(), sample_house()]);
        assert_eq!(matrix.dim(), (2, 20));
    }
}
