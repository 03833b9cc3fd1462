use serde_json::{Value, json};

/// Three orders whose amounts sum to 600.
pub fn orders() -> Value {
    json!([
        { "id": "o1", "amount": 100, "status": "paid" },
        { "id": "o2", "amount": 200, "status": "open" },
        { "id": "o3", "amount": 300, "status": "paid" }
    ])
}

/// Two products for the simple repeater case.
pub fn products() -> Value {
    json!([
        { "name": "A", "price": 10 },
        { "name": "B", "price": 20 }
    ])
}

/// Categories that each carry their own products.
pub fn categories() -> Value {
    json!([
        {
            "name": "Lighting",
            "products": [
                { "name": "Lamp", "price": 20 },
                { "name": "Bulb", "price": 2.5 }
            ]
        },
        {
            "name": "Office",
            "products": [
                { "name": "Desk", "price": 150 }
            ]
        },
        {
            "name": "Empty",
            "products": []
        }
    ])
}

/// A page document exercising state, users, tables and nested repeaters.
pub fn catalog_page() -> Value {
    json!({
        "state": { "title": "Catalog", "discount": 0.1 },
        "user": { "name": "Ada", "role": "admin" },
        "now": "2024-03-31T14:05:09",
        "tables": {
            "categories": categories(),
            "orders": { "id": "tbl_orders", "rows": orders() }
        },
        "components": [
            {
                "id": "heading",
                "kind": "text",
                "props": { "text": "{{title}} for {{user.name}} on {{today|date:DD/MM/YYYY}}" }
            },
            {
                "id": "summary",
                "kind": "text",
                "bindings": {
                    "text": { "type": "dynamic", "expression": "{{orders.count()}} orders, {{tbl_orders.sum(amount)|currency:USD}}" }
                }
            },
            {
                "id": "categories",
                "kind": "repeater",
                "bindings": { "data": { "type": "table", "table": "categories" } },
                "children": [
                    {
                        "id": "category",
                        "kind": "container",
                        "props": { "title": "{{item.name}} ({{item.products.count()}})" },
                        "children": [
                            {
                                "id": "products",
                                "kind": "repeater",
                                "props": { "data": "{{item.products}}" },
                                "children": [
                                    {
                                        "id": "product",
                                        "kind": "button",
                                        "props": {
                                            "label": "{{item.name}} - {{item.price|currency:USD}}",
                                            "sale": "{{formula:round({item.price} * (1 - {discount}), 2)}}"
                                        },
                                        "events": [
                                            { "event": "click", "action": "navigate", "params": { "product": "{{item.name}}" } }
                                        ]
                                    }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    })
}
