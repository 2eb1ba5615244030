//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Pairing sessions, one per requested code.
    ///
    /// A partial unique index on `code WHERE status = 'pending'` keeps pending
    /// codes unique.
    pairing_sessions (id) {
        /// Primary key: `pair_` followed by 32 hex characters.
        id -> Varchar,
        /// Owning user.
        user_id -> Uuid,
        /// Six-digit pairing code.
        code -> Varchar,
        /// Device bound by the claim.
        device_id -> Nullable<Varchar>,
        /// `pending`, `paired`, or `expired`.
        status -> Varchar,
        /// Claim deadline.
        expires_at -> Timestamptz,
        /// Claim time.
        paired_at -> Nullable<Timestamptz>,
        /// Issue time.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Paired devices and the digest of their bearer token.
    devices (device_id) {
        /// Primary key: caller-supplied device identifier.
        device_id -> Varchar,
        /// Owning user.
        user_id -> Uuid,
        device_name -> Varchar,
        device_type -> Varchar,
        firmware_version -> Nullable<Varchar>,
        hardware_version -> Nullable<Varchar>,
        mac_address -> Nullable<Varchar>,
        /// Hex SHA-256 of the bearer token (unique).
        token_digest -> Varchar,
        /// Soft-delete marker.
        is_active -> Bool,
        paired_at -> Timestamptz,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Last reported battery level, 0 to 100.
        battery_level -> Nullable<Int2>,
        /// Last status report time.
        last_sync_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(pairing_sessions, devices);
