use crate::database::error::DatabaseError;
use sqlx::{types::BigDecimal, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Ride entity as stored
#[derive(Debug, Clone, FromRow)]
pub struct Ride {
    pub ride_id: Uuid,
    pub origin_address: String,
    pub destination_address: String,
    pub origin_latitude: BigDecimal,
    pub origin_longitude: BigDecimal,
    pub destination_latitude: BigDecimal,
    pub destination_longitude: BigDecimal,
    pub ride_time: i32,
    pub fare_price: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub driver_id: i32,
    pub user_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Ride joined with its driver's public profile. Driver columns are
/// nullable so rides survive a deleted driver row.
#[derive(Debug, Clone, FromRow)]
pub struct RideWithDriver {
    pub ride_id: Uuid,
    pub origin_address: String,
    pub destination_address: String,
    pub origin_latitude: BigDecimal,
    pub origin_longitude: BigDecimal,
    pub destination_latitude: BigDecimal,
    pub destination_longitude: BigDecimal,
    pub ride_time: i32,
    pub fare_price: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub driver_id: i32,
    pub user_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub driver_first_name: Option<String>,
    pub driver_last_name: Option<String>,
    pub driver_profile_image_url: Option<String>,
    pub driver_car_image_url: Option<String>,
    pub driver_car_seats: Option<i32>,
    pub driver_rating: Option<BigDecimal>,
}

/// Fields required to record a ride. Amount is the fare in major
/// currency units, as quoted to the rider.
#[derive(Debug, Clone)]
pub struct NewRide {
    pub origin_address: String,
    pub destination_address: String,
    pub origin_latitude: BigDecimal,
    pub origin_longitude: BigDecimal,
    pub destination_latitude: BigDecimal,
    pub destination_longitude: BigDecimal,
    pub ride_time: i32,
    pub fare_price: BigDecimal,
    pub status: String,
    pub payment_status: String,
    pub driver_id: i32,
    pub user_id: String,
}

const RIDE_COLUMNS: &str = "ride_id, origin_address, destination_address, origin_latitude, \
     origin_longitude, destination_latitude, destination_longitude, ride_time, fare_price, \
     status, payment_status, driver_id, user_id, created_at";

/// Repository for managing rides
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new ride record
    pub async fn create_ride(&self, ride: &NewRide) -> Result<Ride, DatabaseError> {
        sqlx::query_as::<_, Ride>(
            "INSERT INTO rides \
             (origin_address, destination_address, origin_latitude, origin_longitude, \
              destination_latitude, destination_longitude, ride_time, fare_price, \
              status, payment_status, driver_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING ride_id, origin_address, destination_address, origin_latitude, \
                       origin_longitude, destination_latitude, destination_longitude, \
                       ride_time, fare_price, status, payment_status, driver_id, user_id, \
                       created_at",
        )
        .bind(&ride.origin_address)
        .bind(&ride.destination_address)
        .bind(&ride.origin_latitude)
        .bind(&ride.origin_longitude)
        .bind(&ride.destination_latitude)
        .bind(&ride.destination_longitude)
        .bind(ride.ride_time)
        .bind(&ride.fare_price)
        .bind(&ride.status)
        .bind(&ride.payment_status)
        .bind(ride.driver_id)
        .bind(&ride.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Find a ride by its id
    pub async fn find_by_id(&self, ride_id: Uuid) -> Result<Option<Ride>, DatabaseError> {
        sqlx::query_as::<_, Ride>(&format!(
            "SELECT {RIDE_COLUMNS} FROM rides WHERE ride_id = $1"
        ))
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// All rides for a user, most recent first, joined with driver profiles
    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<RideWithDriver>, DatabaseError> {
        sqlx::query_as::<_, RideWithDriver>(
            "SELECT r.ride_id, r.origin_address, r.destination_address, r.origin_latitude, \
                    r.origin_longitude, r.destination_latitude, r.destination_longitude, \
                    r.ride_time, r.fare_price, r.status, r.payment_status, r.driver_id, \
                    r.user_id, r.created_at, \
                    d.first_name AS driver_first_name, d.last_name AS driver_last_name, \
                    d.profile_image_url AS driver_profile_image_url, \
                    d.car_image_url AS driver_car_image_url, \
                    d.car_seats AS driver_car_seats, d.rating AS driver_rating \
             FROM rides r \
             LEFT JOIN drivers d ON r.driver_id = d.id \
             WHERE r.user_id = $1 \
             ORDER BY r.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Partial update of a ride's mutable fields. Every provided field
    /// is bound as a parameter; no SQL is assembled from request values.
    pub async fn update_ride(
        &self,
        ride_id: Uuid,
        status: Option<&str>,
        driver_id: Option<i32>,
    ) -> Result<Option<Ride>, DatabaseError> {
        if status.is_none() && driver_id.is_none() {
            return self.find_by_id(ride_id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE rides SET ");
        let mut first = true;

        if let Some(status) = status {
            builder.push("status = ").push_bind(status);
            first = false;
        }
        if let Some(driver) = driver_id {
            if !first {
                builder.push(", ");
            }
            builder.push("driver_id = ").push_bind(driver);
        }

        builder
            .push(" WHERE ride_id = ")
            .push_bind(ride_id)
            .push(format!(" RETURNING {RIDE_COLUMNS}"));

        builder
            .build_query_as::<Ride>()
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_sqlx)
    }
}
