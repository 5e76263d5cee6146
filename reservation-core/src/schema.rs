diesel::table! {
    shipping_zones (id) {
        id -> Uuid,
        name -> Varchar,
        countries -> Array<Text>,
    }
}

diesel::table! {
    product_variants (id) {
        id -> Uuid,
        sku -> Varchar,
        name -> Varchar,
    }
}

diesel::table! {
    warehouse_stocks (id) {
        id -> Uuid,
        product_variant_id -> Uuid,
        shipping_zone_id -> Uuid,
        quantity -> Int4,
    }
}

diesel::table! {
    reservations (id) {
        id -> Uuid,
        user_id -> Uuid,
        shipping_zone_id -> Uuid,
        product_variant_id -> Uuid,
        quantity -> Int4,
        expires_at -> Timestamptz,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    shipping_zones,
    product_variants,
    warehouse_stocks,
    reservations,
);
