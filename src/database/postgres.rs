use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{self, postgres::PgArguments, types::Json, FromRow, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::repository::PropertyStore;
use crate::filter::sql::{count_sql, select_sql};
use crate::filter::{Predicate, SqlParam, Window};
use crate::models::{Identity, Location, NewProperty, Property, PropertyFields, Rates, SellerInfo};

const TABLE: &str = "properties";

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS "properties" (
        "id"          UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        "type"        TEXT NOT NULL,
        "name"        TEXT NOT NULL,
        "description" TEXT NOT NULL DEFAULT '',
        "location"    JSONB NOT NULL DEFAULT '{}'::jsonb,
        "beds"        INTEGER,
        "baths"       DOUBLE PRECISION,
        "square_feet" INTEGER,
        "amenities"   TEXT[] NOT NULL DEFAULT '{}',
        "rates"       JSONB NOT NULL DEFAULT '{}'::jsonb,
        "seller_info" JSONB NOT NULL DEFAULT '{}'::jsonb,
        "images"      TEXT[] NOT NULL DEFAULT '{}',
        "owner"       TEXT NOT NULL CHECK ("owner" <> ''),
        "is_featured" BOOLEAN NOT NULL DEFAULT FALSE,
        "created_at"  TIMESTAMPTZ NOT NULL DEFAULT now(),
        "updated_at"  TIMESTAMPTZ NOT NULL DEFAULT now()
    )"#,
    r#"CREATE INDEX IF NOT EXISTS "properties_owner_idx" ON "properties" ("owner")"#,
    r#"CREATE INDEX IF NOT EXISTS "properties_featured_idx" ON "properties" ("is_featured") WHERE "is_featured""#,
    r#"CREATE INDEX IF NOT EXISTS "properties_created_idx" ON "properties" ("created_at", "id")"#,
];

#[derive(Debug, FromRow)]
struct PropertyRow {
    id: Uuid,
    #[sqlx(rename = "type")]
    property_type: String,
    name: String,
    description: String,
    location: Json<Location>,
    beds: Option<i32>,
    baths: Option<f64>,
    square_feet: Option<i32>,
    amenities: Vec<String>,
    rates: Json<Rates>,
    seller_info: Json<SellerInfo>,
    images: Vec<String>,
    owner: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            fields: PropertyFields {
                property_type: row.property_type,
                name: row.name,
                description: row.description,
                location: row.location.0,
                beds: row.beds,
                baths: row.baths,
                square_feet: row.square_feet,
                amenities: row.amenities,
                rates: row.rates.0,
                seller_info: row.seller_info.0,
            },
            images: row.images,
            owner: Identity::new(row.owner),
            is_featured: row.is_featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed property store
pub struct PgPropertyStore {
    pool: PgPool,
}

impl PgPropertyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Property schema ready");
        Ok(())
    }
}

#[async_trait]
impl PropertyStore for PgPropertyStore {
    async fn count(&self, filter: &Predicate) -> Result<u64, DatabaseError> {
        let sql_result = count_sql(TABLE, filter);
        debug!(query = %sql_result.query, "count");
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find(&self, filter: &Predicate, window: Option<Window>) -> Result<Vec<Property>, DatabaseError> {
        let sql_result = select_sql(TABLE, filter, window);
        debug!(query = %sql_result.query, "find");
        let mut q = sqlx::query_as::<_, PropertyRow>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Property::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Property>, DatabaseError> {
        let row = sqlx::query_as::<_, PropertyRow>(r#"SELECT * FROM "properties" WHERE "id" = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Property::from))
    }

    async fn insert(&self, property: NewProperty) -> Result<Property, DatabaseError> {
        let NewProperty { fields, images, owner } = property;
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"INSERT INTO "properties"
                ("type", "name", "description", "location", "beds", "baths", "square_feet",
                 "amenities", "rates", "seller_info", "images", "owner")
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING *"#,
        )
        .bind(fields.property_type)
        .bind(fields.name)
        .bind(fields.description)
        .bind(Json(fields.location))
        .bind(fields.beds)
        .bind(fields.baths)
        .bind(fields.square_feet)
        .bind(fields.amenities)
        .bind(Json(fields.rates))
        .bind(Json(fields.seller_info))
        .bind(images)
        .bind(owner.as_str().to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn replace(&self, id: Uuid, fields: PropertyFields, images: Vec<String>) -> Result<Option<Property>, DatabaseError> {
        let row = sqlx::query_as::<_, PropertyRow>(
            r#"UPDATE "properties" SET
                "type" = $2, "name" = $3, "description" = $4, "location" = $5,
                "beds" = $6, "baths" = $7, "square_feet" = $8, "amenities" = $9,
                "rates" = $10, "seller_info" = $11, "images" = $12, "updated_at" = now()
               WHERE "id" = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(fields.property_type)
        .bind(fields.name)
        .bind(fields.description)
        .bind(Json(fields.location))
        .bind(fields.beds)
        .bind(fields.baths)
        .bind(fields.square_feet)
        .bind(fields.amenities)
        .bind(Json(fields.rates))
        .bind(Json(fields.seller_info))
        .bind(images)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Property::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(r#"DELETE FROM "properties" WHERE "id" = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Int(i) => q.bind(*i),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        SqlParam::Bool(b) => q.bind(*b),
        SqlParam::Text(s) => q.bind(s.as_str()),
        SqlParam::Int(i) => q.bind(*i),
    }
}
