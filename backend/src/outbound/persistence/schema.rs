//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. When the
//! migrations change, regenerate with `diesel print-schema` or update by hand.

diesel::table! {
    /// Staff accounts able to sign in to the back office.
    staff (id) {
        id -> Uuid,
        /// Lowercased login email.
        email -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        name -> Text,
        /// `staff` or `manager`.
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Loyalty customers, optionally linked to a Shopify customer.
    customers (id) {
        id -> Uuid,
        name -> Text,
        email -> Nullable<Varchar>,
        phone -> Nullable<Text>,
        shopify_customer_id -> Nullable<Text>,
        total_purchases -> Int4,
        total_spent -> Float8,
        /// Current unredeemed card; cleared when that card is deleted.
        active_punchcard_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        /// Maintained by the `customers_touch_updated_at` trigger.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    punchcards (id) {
        id -> Uuid,
        customer_id -> Uuid,
        punches -> Int4,
        capacity -> Int4,
        redeemed_at -> Nullable<Timestamptz>,
        redeemed_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    redemptions (id) {
        id -> Uuid,
        customer_id -> Uuid,
        punchcard_id -> Uuid,
        redeemed_by -> Nullable<Uuid>,
        notes -> Nullable<Text>,
        redeemed_at -> Timestamptz,
    }
}

diesel::table! {
    engagement_events (id) {
        id -> Uuid,
        customer_id -> Nullable<Uuid>,
        platform -> Text,
        engagement_type -> Varchar,
        customer_email -> Nullable<Varchar>,
        content -> Nullable<Text>,
        email_sent -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(punchcards -> customers (customer_id));
diesel::joinable!(redemptions -> customers (customer_id));
diesel::joinable!(engagement_events -> customers (customer_id));

diesel::allow_tables_to_appear_in_same_query!(
    staff,
    customers,
    punchcards,
    redemptions,
    engagement_events,
);
