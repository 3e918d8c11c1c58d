pub const TABLES_QUERY: &str = r#"
SELECT name, wr AS without_rowid FROM pragma_table_list
WHERE schema = 'main' AND type = 'table' AND name NOT LIKE 'sqlite_%'
ORDER BY name;
"#;

pub const COLUMNS_QUERY: &str = r#"
SELECT
    p.name AS column_name,
    p.type AS data_type,
    p."notnull" AS not_null,
    p.pk AS pk_position
FROM pragma_table_info(?1) p
ORDER BY p.cid;
"#;

pub const FOREIGN_KEYS_QUERY: &str = r#"
SELECT
    f.id AS fk_id,
    f.seq AS seq,
    f."from" AS column_name,
    f."table" AS references_table,
    f."to" AS references_column
FROM pragma_foreign_key_list(?1) f
ORDER BY f.id, f.seq;
"#;

pub const SNAPSHOT_QUERY: &str = "SELECT COUNT(*) FROM sqlite_master;";
