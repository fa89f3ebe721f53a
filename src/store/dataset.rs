//! Read-only in-memory dataset

use crate::error::{Error, Result};
use crate::types::{Car, User};

use super::query::{coerce_number, CarFilter};

/// Users and cars served by the API. Built once and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    users: Vec<User>,
    cars: Vec<Car>,
}

impl Dataset {
    pub fn new(users: Vec<User>, cars: Vec<Car>) -> Self {
        Self { users, cars }
    }

    /// The demo records the service ships with
    pub fn seed() -> Self {
        let user = |id, name: &str, email: &str| User {
            id,
            name: name.into(),
            email: email.into(),
        };
        let car = |id, brand: &str, model: &str, year, price| Car {
            id,
            brand: brand.into(),
            model: model.into(),
            year,
            price,
        };

        Self::new(
            vec![
                user(1, "Victor", "victor@domain.com"),
                user(2, "Maria", "maria@domain.com"),
            ],
            vec![
                car(1, "Toyota", "Corolla", 2022, 120000),
                car(1, "Toyota", "Hilux", 2025, 180000),
                car(2, "Honda", "Civic", 2021, 115000),
                car(3, "Ford", "Mustang", 2020, 250000),
                car(4, "Volkswagen", "Golf", 2019, 90000),
                car(5, "Chevrolet", "Onix", 2023, 80000),
            ],
        )
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    /// First user whose id equals `id`
    pub fn find_user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Resolve a user from a raw path segment.
    ///
    /// A segment that is not a positive number is invalid input. A positive
    /// non-integer is accepted but matches nobody.
    pub fn find_user_by_param(&self, raw: &str) -> Result<&User> {
        let n = coerce_number(raw);
        if n.is_nan() || n <= 0.0 {
            return Err(Error::InvalidInput("Invalid user ID".into()));
        }

        let found = if n.is_finite() && n.fract() == 0.0 {
            self.find_user(n as i64)
        } else {
            None
        };
        found.ok_or_else(|| Error::NotFound("Not found".into()))
    }

    /// Cars matching every supplied filter, in dataset order
    pub fn search_cars(&self, filter: &CarFilter) -> Vec<Car> {
        let brand = filter.brand.as_deref().map(str::to_lowercase);
        let model = filter.model.as_deref().map(str::to_lowercase);

        self.cars
            .iter()
            .filter(|c| filter.id.map_or(true, |id| c.id == id))
            .filter(|c| contains_ci(&c.brand, brand.as_deref()))
            .filter(|c| contains_ci(&c.model, model.as_deref()))
            .filter(|c| filter.year.map_or(true, |year| c.year == year))
            .filter(|c| filter.max_price.map_or(true, |max| c.price <= max))
            .cloned()
            .collect()
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) if !needle.is_empty() => haystack.to_lowercase().contains(needle),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(cars: &[Car]) -> Vec<&str> {
        cars.iter().map(|c| c.model.as_str()).collect()
    }

    #[test]
    fn test_find_user() {
        let data = Dataset::seed();
        assert_eq!(data.find_user(2).map(|u| u.name.as_str()), Some("Maria"));
        assert!(data.find_user(99).is_none());
    }

    #[test]
    fn test_find_user_by_param() {
        let data = Dataset::seed();
        assert_eq!(data.find_user_by_param("1").unwrap().name, "Victor");
        assert!(matches!(data.find_user_by_param("1.5"), Err(Error::NotFound(_))));
        assert!(matches!(data.find_user_by_param("3"), Err(Error::NotFound(_))));
        for raw in ["0", "-4", "abc"] {
            assert!(matches!(data.find_user_by_param(raw), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn test_no_filter_returns_everything() {
        let data = Dataset::seed();
        assert_eq!(data.search_cars(&CarFilter::default()), data.cars());
    }

    #[test]
    fn test_brand_is_case_insensitive_substring() {
        let data = Dataset::seed();
        let filter = CarFilter {
            brand: Some("yOt".into()),
            ..Default::default()
        };
        assert_eq!(models(&data.search_cars(&filter)), vec!["Corolla", "Hilux"]);
    }

    #[test]
    fn test_filters_combine() {
        let data = Dataset::seed();
        let filter = CarFilter {
            brand: Some("toyota".into()),
            max_price: Some(150000),
            ..Default::default()
        };
        assert_eq!(models(&data.search_cars(&filter)), vec!["Corolla"]);
    }

    #[test]
    fn test_max_price_is_inclusive() {
        let data = Dataset::seed();
        let filter = CarFilter {
            max_price: Some(90000),
            ..Default::default()
        };
        assert_eq!(models(&data.search_cars(&filter)), vec!["Golf", "Onix"]);
    }

    #[test]
    fn test_id_filter_keeps_duplicates() {
        let data = Dataset::seed();
        let filter = CarFilter {
            id: Some(1),
            ..Default::default()
        };
        assert_eq!(models(&data.search_cars(&filter)), vec!["Corolla", "Hilux"]);
    }

    #[test]
    fn test_empty_string_is_no_filter() {
        let data = Dataset::seed();
        let filter = CarFilter {
            model: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(data.search_cars(&filter).len(), data.cars().len());
    }

    #[test]
    fn test_injected_dataset() {
        let data = Dataset::new(
            Vec::new(),
            vec![Car {
                id: 7,
                brand: "Fiat".into(),
                model: "Uno".into(),
                year: 1999,
                price: 1000,
            }],
        );
        let filter = CarFilter {
            year: Some(1999),
            ..Default::default()
        };
        assert_eq!(models(&data.search_cars(&filter)), vec!["Uno"]);
        assert!(data.find_user(1).is_none());
    }
}
