#![allow(dead_code)]

use rusqlite::Connection;

/// Open a fresh in-memory database with foreign keys enforced.
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    conn
}

/// A small shop schema with a dependency chain, a self reference, and a
/// bookkeeping table, populated with a few rows.
pub fn shop_db() -> Connection {
    let conn = test_db();
    conn.execute_batch(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE products (id INTEGER PRIMARY KEY, sku TEXT NOT NULL);
         CREATE TABLE orders (
             id INTEGER PRIMARY KEY,
             customer_id INTEGER NOT NULL REFERENCES customers(id)
         );
         CREATE TABLE order_items (
             id INTEGER PRIMARY KEY,
             order_id INTEGER NOT NULL REFERENCES orders(id),
             product_id INTEGER NOT NULL REFERENCES products(id),
             bundle_id INTEGER REFERENCES order_items(id)
         );
         CREATE TABLE schema_migrations (version INTEGER PRIMARY KEY);

         INSERT INTO customers VALUES (1, 'ada'), (2, 'grace');
         INSERT INTO products VALUES (1, 'widget'), (2, 'gadget');
         INSERT INTO orders VALUES (1, 1), (2, 2);
         INSERT INTO order_items VALUES (1, 1, 1, NULL), (2, 1, 2, 1), (3, 2, 2, NULL);
         INSERT INTO schema_migrations VALUES (1), (2), (3);",
    )
    .unwrap();
    conn
}

/// Two tables referencing each other, with rows on both sides.
pub fn cyclic_db() -> Connection {
    let conn = test_db();
    conn.execute_batch(
        "CREATE TABLE authors (id INTEGER PRIMARY KEY, featured_book_id INTEGER REFERENCES books(id));
         CREATE TABLE books (id INTEGER PRIMARY KEY, author_id INTEGER NOT NULL REFERENCES authors(id));

         INSERT INTO authors VALUES (1, NULL);
         INSERT INTO books VALUES (10, 1);
         UPDATE authors SET featured_book_id = 10 WHERE id = 1;",
    )
    .unwrap();
    conn
}

/// A two-table cycle (`x` and `y`) where `x` also references `accounts`,
/// which sits in the cycle's layer without owning any of its constraints.
pub fn cyclic_with_parent_db() -> Connection {
    let conn = test_db();
    conn.execute_batch(
        "CREATE TABLE accounts (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         CREATE TABLE x (
             id INTEGER PRIMARY KEY,
             account_id INTEGER NOT NULL REFERENCES accounts(id),
             y_id INTEGER REFERENCES y(id)
         );
         CREATE TABLE y (id INTEGER PRIMARY KEY, x_id INTEGER NOT NULL REFERENCES x(id));

         INSERT INTO accounts VALUES (1, 'ops'), (2, 'billing');
         INSERT INTO x VALUES (1, 1, NULL), (2, 2, NULL);
         INSERT INTO y VALUES (1, 1), (2, 2);
         UPDATE x SET y_id = id;",
    )
    .unwrap();
    conn
}

/// Row count of `table`.
pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
