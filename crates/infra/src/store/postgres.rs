//! Postgres-backed credential store.
//!
//! Every `StoreTx` wraps one `sqlx` transaction. Enumerations are stored as
//! TEXT using their wire names; ids as UUID; timestamps as TIMESTAMPTZ.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` (by constraint name) |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / other | N/A | `Backend` |

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use orgdesk_core::{InvoiceId, OrganizationId, RegistrationId, UserId};
use orgdesk_invoicing::Invoice;
use orgdesk_tenancy::{
    Organization, RegistrationRequest, RegistrationStatus, SchoolProfile, UserAccount,
};

use super::{CredentialStore, StoreError, StoreTx, UniqueConstraint};
use crate::sequence::{IdentifierKind, SequenceScope};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists (statements are idempotent).
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.apply_schema().await?;
        Ok(store)
    }

    pub async fn apply_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("apply_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PgTx { tx }))
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

const ORG_COLUMNS: &str = "id, name, code, org_type, industry_type, subscription_tier, status, \
     is_active, expiration_date, parent_organization_id, created_at";
const USER_COLUMNS: &str =
    "id, email, password_hash, full_name, role, organization_id, is_active, created_at";
const REGISTRATION_COLUMNS: &str = "id, org_name, org_type, org_code, contact_person, official_email, \
     phone, address, industry_type, status, assigned_tier, reviewed_by_id, created_at, updated_at";
const INVOICE_COLUMNS: &str = "id, invoice_number, organization_id, amount, tier, status, \
     payment_method, transaction_number, paid_at, created_at";

#[async_trait]
impl StoreTx for PgTx {
    #[instrument(skip(self), fields(organization_id = %id), err)]
    async fn find_organization(&mut self, id: OrganizationId) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_organization", e))?;
        row.as_ref().map(organization_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_organization_by_code(&mut self, code: &str) -> Result<Option<Organization>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ORG_COLUMNS} FROM organizations WHERE code = $1"))
            .bind(code)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_organization_by_code", e))?;
        row.as_ref().map(organization_from_row).transpose()
    }

    #[instrument(skip(self, org), fields(organization_id = %org.id, code = %org.code), err)]
    async fn insert_organization(&mut self, org: &Organization) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO organizations (
                id, name, code, org_type, industry_type, subscription_tier, status,
                is_active, expiration_date, parent_organization_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(org.id.as_uuid())
        .bind(&org.name)
        .bind(&org.code)
        .bind(org.org_type.as_str())
        .bind(org.industry_type.as_str())
        .bind(org.subscription_tier.as_str())
        .bind(org.status.as_str())
        .bind(org.is_active)
        .bind(org.expiration_date)
        .bind(org.parent_organization_id.map(|id| *id.as_uuid()))
        .bind(org.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_organization", e))?;
        Ok(())
    }

    #[instrument(skip(self, org), fields(organization_id = %org.id), err)]
    async fn update_organization(&mut self, org: &Organization) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE organizations
            SET name = $2, subscription_tier = $3, status = $4, is_active = $5,
                expiration_date = $6, parent_organization_id = $7
            WHERE id = $1
            "#,
        )
        .bind(org.id.as_uuid())
        .bind(&org.name)
        .bind(org.subscription_tier.as_str())
        .bind(org.status.as_str())
        .bind(org.is_active)
        .bind(org.expiration_date)
        .bind(org.parent_organization_id.map(|id| *id.as_uuid()))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_organization", e))?;
        ensure_updated(result.rows_affected())
    }

    #[instrument(skip(self, profile), fields(organization_id = %profile.organization_id), err)]
    async fn insert_school_profile(&mut self, profile: &SchoolProfile) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO school_profiles (id, organization_id, name, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(profile.id.as_uuid())
        .bind(profile.organization_id.as_uuid())
        .bind(&profile.name)
        .bind(profile.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_school_profile", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_user(&mut self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<UserAccount>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, role = %user.role), err)]
    async fn insert_user(&mut self, user: &UserAccount) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, password_hash, full_name, role, organization_id, is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.organization_id.map(|id| *id.as_uuid()))
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn update_user(&mut self, user: &UserAccount) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, full_name = $3, role = $4, is_active = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        ensure_updated(result.rows_affected())
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn list_users(&mut self, organization_id: OrganizationId) -> Result<Vec<UserAccount>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE organization_id = $1 ORDER BY created_at ASC"
        ))
        .bind(organization_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(registration_id = %id), err)]
    async fn find_registration(&mut self, id: RegistrationId) -> Result<Option<RegistrationRequest>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registration_requests WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_registration", e))?;
        row.as_ref().map(registration_from_row).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_open_registration(
        &mut self,
        code: &str,
        email: &str,
    ) -> Result<Option<RegistrationRequest>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registration_requests
            WHERE status IN ('PENDING', 'REVIEWING') AND (org_code = $1 OR official_email = $2)
            LIMIT 1
            "#
        ))
        .bind(code)
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_open_registration", e))?;
        row.as_ref().map(registration_from_row).transpose()
    }

    #[instrument(skip(self, request), fields(registration_id = %request.id, code = %request.org_code), err)]
    async fn insert_registration(&mut self, request: &RegistrationRequest) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO registration_requests (
                id, org_name, org_type, org_code, contact_person, official_email, phone,
                address, industry_type, status, assigned_tier, reviewed_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(&request.org_name)
        .bind(request.org_type.as_str())
        .bind(&request.org_code)
        .bind(&request.contact_person)
        .bind(&request.official_email)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(request.industry_type.as_str())
        .bind(request.status.as_str())
        .bind(request.assigned_tier.map(|t| t.as_str()))
        .bind(request.reviewed_by_id.map(|id| *id.as_uuid()))
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_registration", e))?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(registration_id = %request.id, status = %request.status), err)]
    async fn update_registration(&mut self, request: &RegistrationRequest) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE registration_requests
            SET status = $2, assigned_tier = $3, reviewed_by_id = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.status.as_str())
        .bind(request.assigned_tier.map(|t| t.as_str()))
        .bind(request.reviewed_by_id.map(|id| *id.as_uuid()))
        .bind(request.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_registration", e))?;
        ensure_updated(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn list_registrations(
        &mut self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<RegistrationRequest>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registration_requests
            WHERE $1::TEXT IS NULL OR status = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_registrations", e))?;
        rows.iter().map(registration_from_row).collect()
    }

    #[instrument(skip(self), fields(invoice_id = %id), err)]
    async fn find_invoice(&mut self, id: InvoiceId) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_invoice", e))?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn find_outstanding_invoice(&mut self, organization_id: OrganizationId) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE organization_id = $1 AND status IN ('UNPAID', 'PENDING')
            "#
        ))
        .bind(organization_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_outstanding_invoice", e))?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    #[instrument(skip(self), fields(organization_id = %organization_id), err)]
    async fn find_latest_paid_invoice(&mut self, organization_id: OrganizationId) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE organization_id = $1 AND status = 'PAID'
            ORDER BY paid_at DESC, created_at DESC
            LIMIT 1
            "#
        ))
        .bind(organization_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("find_latest_paid_invoice", e))?;
        row.as_ref().map(invoice_from_row).transpose()
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, number = %invoice.invoice_number), err)]
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, organization_id, amount, tier, status,
                payment_method, transaction_number, paid_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(&invoice.invoice_number)
        .bind(invoice.organization_id.as_uuid())
        .bind(invoice.amount)
        .bind(invoice.tier.as_str())
        .bind(invoice.status.as_str())
        .bind(invoice.payment_method.map(|m| m.as_str()))
        .bind(&invoice.transaction_number)
        .bind(invoice.paid_at)
        .bind(invoice.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_invoice", e))?;
        Ok(())
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id, status = invoice.status.as_str()), err)]
    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET amount = $2, tier = $3, status = $4, payment_method = $5,
                transaction_number = $6, paid_at = $7
            WHERE id = $1
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.amount)
        .bind(invoice.tier.as_str())
        .bind(invoice.status.as_str())
        .bind(invoice.payment_method.map(|m| m.as_str()))
        .bind(&invoice.transaction_number)
        .bind(invoice.paid_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_invoice", e))?;
        ensure_updated(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn list_invoices(&mut self, organization_id: Option<OrganizationId>) -> Result<Vec<Invoice>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {INVOICE_COLUMNS} FROM invoices
            WHERE $1::UUID IS NULL OR organization_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(organization_id.map(|id| *id.as_uuid()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("list_invoices", e))?;
        rows.iter().map(invoice_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn current_counter(&mut self, scope: &SequenceScope) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query(
            "SELECT value FROM sequence_counters WHERE kind = $1 AND org_code = $2 AND year = $3",
        )
        .bind(scope.kind.as_str())
        .bind(&scope.org_code)
        .bind(scope.year)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("current_counter", e))?;
        row.map(|r| r.try_get::<i64, _>("value").map_err(|e| decode_error("value", e)))
            .transpose()
    }

    #[instrument(skip(self), err)]
    async fn advance_counter(&mut self, scope: &SequenceScope, seed: i64) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO sequence_counters (kind, org_code, year, value)
            VALUES ($1, $2, $3, $4 + 1)
            ON CONFLICT (kind, org_code, year)
            DO UPDATE SET value = sequence_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(scope.kind.as_str())
        .bind(&scope.org_code)
        .bind(scope.year)
        .bind(seed)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("advance_counter", e))?;
        row.try_get::<i64, _>("value").map_err(|e| decode_error("value", e))
    }

    #[instrument(skip(self), err)]
    async fn identifiers_with_prefix(
        &mut self,
        kind: IdentifierKind,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT identifier FROM issued_identifiers WHERE kind = $1 AND starts_with(identifier, $2)",
        )
        .bind(kind.as_str())
        .bind(prefix)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("identifiers_with_prefix", e))?;
        rows.iter()
            .map(|r| r.try_get::<String, _>("identifier").map_err(|e| decode_error("identifier", e)))
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn record_identifier(
        &mut self,
        kind: IdentifierKind,
        org_code: &str,
        identifier: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO issued_identifiers (kind, identifier, org_code)
            VALUES ($1, $2, $3)
            ON CONFLICT (kind, identifier) DO NOTHING
            "#,
        )
        .bind(kind.as_str())
        .bind(identifier)
        .bind(org_code)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("record_identifier", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn ensure_updated(rows_affected: u64) -> Result<(), StoreError> {
    if rows_affected == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

fn decode_error(column: &str, err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to read {column}: {err}"))
}

fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(column).map_err(|e| decode_error(column, e))?;
    raw.parse()
        .map_err(|e: T::Err| StoreError::Backend(format!("invalid {column} '{raw}': {e}")))
}

fn parse_optional_column<T>(row: &PgRow, column: &str) -> Result<Option<T>, StoreError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    let raw: Option<String> = row.try_get(column).map_err(|e| decode_error(column, e))?;
    raw.map(|value| {
        value
            .parse()
            .map_err(|e: T::Err| StoreError::Backend(format!("invalid {column} '{value}': {e}")))
    })
    .transpose()
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(|e| decode_error(column, e))
}

fn organization_from_row(row: &PgRow) -> Result<Organization, StoreError> {
    Ok(Organization {
        id: OrganizationId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        code: get(row, "code")?,
        org_type: parse_column(row, "org_type")?,
        industry_type: parse_column(row, "industry_type")?,
        subscription_tier: parse_column(row, "subscription_tier")?,
        status: parse_column(row, "status")?,
        is_active: get(row, "is_active")?,
        expiration_date: get(row, "expiration_date")?,
        parent_organization_id: get::<Option<Uuid>>(row, "parent_organization_id")?
            .map(OrganizationId::from_uuid),
        created_at: get(row, "created_at")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<UserAccount, StoreError> {
    Ok(UserAccount {
        id: UserId::from_uuid(get(row, "id")?),
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        full_name: get(row, "full_name")?,
        role: parse_column(row, "role")?,
        organization_id: get::<Option<Uuid>>(row, "organization_id")?.map(OrganizationId::from_uuid),
        is_active: get(row, "is_active")?,
        created_at: get(row, "created_at")?,
    })
}

fn registration_from_row(row: &PgRow) -> Result<RegistrationRequest, StoreError> {
    Ok(RegistrationRequest {
        id: RegistrationId::from_uuid(get(row, "id")?),
        org_name: get(row, "org_name")?,
        org_type: parse_column(row, "org_type")?,
        org_code: get(row, "org_code")?,
        contact_person: get(row, "contact_person")?,
        official_email: get(row, "official_email")?,
        phone: get(row, "phone")?,
        address: get(row, "address")?,
        industry_type: parse_column(row, "industry_type")?,
        status: parse_column(row, "status")?,
        assigned_tier: parse_optional_column(row, "assigned_tier")?,
        reviewed_by_id: get::<Option<Uuid>>(row, "reviewed_by_id")?.map(UserId::from_uuid),
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn invoice_from_row(row: &PgRow) -> Result<Invoice, StoreError> {
    Ok(Invoice {
        id: InvoiceId::from_uuid(get(row, "id")?),
        invoice_number: get(row, "invoice_number")?,
        organization_id: OrganizationId::from_uuid(get(row, "organization_id")?),
        amount: get(row, "amount")?,
        tier: parse_column(row, "tier")?,
        status: parse_column(row, "status")?,
        payment_method: parse_optional_column(row, "payment_method")?,
        transaction_number: get(row, "transaction_number")?,
        paid_at: get(row, "paid_at")?,
        created_at: get(row, "created_at")?,
    })
}

/// Map SQLx errors to store errors, resolving unique violations by constraint name.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = match db_err.constraint() {
                    Some("organizations_code_key") => UniqueConstraint::OrganizationCode,
                    Some("users_email_key") => UniqueConstraint::UserEmail,
                    Some("invoices_invoice_number_key") => UniqueConstraint::InvoiceNumber,
                    Some("invoices_one_outstanding_per_org") => UniqueConstraint::OutstandingInvoice,
                    Some("issued_identifiers_pkey") => UniqueConstraint::Identifier,
                    Some("school_profiles_organization_id_key") => UniqueConstraint::SchoolProfile,
                    other => UniqueConstraint::Other(other.unwrap_or("unknown").to_string()),
                };
                return StoreError::UniqueViolation(constraint);
            }
            StoreError::Backend(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Backend(format!("error in {}: {}", operation, other)),
    }
}
