use crate::database::error::DatabaseError;
use sqlx::{types::BigDecimal, FromRow, PgPool};

/// Driver profile as shown to riders
#[derive(Debug, Clone, FromRow)]
pub struct Driver {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    pub car_image_url: Option<String>,
    pub car_seats: i32,
    pub rating: Option<BigDecimal>,
}

/// Registration payload for a new driver
#[derive(Debug, Clone)]
pub struct NewDriver {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image_url: Option<String>,
    pub car_image_url: Option<String>,
    pub car_seats: i32,
    pub rating: Option<BigDecimal>,
}

pub struct DriverRepository {
    pool: PgPool,
}

impl DriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_drivers(&self) -> Result<Vec<Driver>, DatabaseError> {
        sqlx::query_as::<_, Driver>(
            "SELECT id, first_name, last_name, email, profile_image_url, car_image_url, \
                    car_seats, rating \
             FROM drivers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Driver>, DatabaseError> {
        sqlx::query_as::<_, Driver>(
            "SELECT id, first_name, last_name, email, profile_image_url, car_image_url, \
                    car_seats, rating \
             FROM drivers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    pub async fn create_driver(&self, driver: &NewDriver) -> Result<Driver, DatabaseError> {
        sqlx::query_as::<_, Driver>(
            "INSERT INTO drivers \
             (first_name, last_name, email, profile_image_url, car_image_url, car_seats, rating) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, first_name, last_name, email, profile_image_url, car_image_url, \
                       car_seats, rating",
        )
        .bind(&driver.first_name)
        .bind(&driver.last_name)
        .bind(&driver.email)
        .bind(&driver.profile_image_url)
        .bind(&driver.car_image_url)
        .bind(driver.car_seats)
        .bind(&driver.rating)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
