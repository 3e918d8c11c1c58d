pub const TABLES_QUERY: &str = r#"
SELECT c.relname AS name
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1
AND c.relkind IN ('r', 'p')
AND NOT c.relispartition
ORDER BY c.relname COLLATE "C";
"#;

pub const COLUMNS_QUERY: &str = r#"
SELECT
    a.attname AS column_name,
    format_type(a.atttypid, a.atttypmod) AS data_type,
    NOT a.attnotnull AS nullable,
    COALESCE(pk.position, 0)::bigint AS pk_position
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
LEFT JOIN (
    SELECT i.indrelid, k.attnum, k.position
    FROM pg_index i
    CROSS JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, position)
    WHERE i.indisprimary
    AND k.position <= i.indnkeyatts
) pk ON pk.indrelid = c.oid AND pk.attnum = a.attnum
WHERE n.nspname = $1
AND c.relname = $2
AND a.attnum > 0
AND NOT a.attisdropped
ORDER BY a.attnum;
"#;

pub const FOREIGN_KEYS_QUERY: &str = r#"
SELECT
    con.oid::bigint AS fk_id,
    (k.position - 1)::bigint AS seq,
    src_col.attname AS column_name,
    tgt_ns.nspname AS references_schema,
    tgt.relname AS references_table,
    tgt_col.attname AS references_column
FROM pg_constraint con
JOIN pg_class src ON src.oid = con.conrelid
JOIN pg_namespace n ON n.oid = src.relnamespace
JOIN pg_class tgt ON tgt.oid = con.confrelid
JOIN pg_namespace tgt_ns ON tgt_ns.oid = tgt.relnamespace
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(src_attnum, tgt_attnum, position)
JOIN pg_attribute src_col ON src_col.attrelid = con.conrelid AND src_col.attnum = k.src_attnum
JOIN pg_attribute tgt_col ON tgt_col.attrelid = con.confrelid AND tgt_col.attnum = k.tgt_attnum
WHERE con.contype = 'f'
AND con.conparentid = 0
AND n.nspname = $1
AND src.relname = $2
ORDER BY con.oid, k.position;
"#;

pub const SNAPSHOT_ISOLATION: &str =
    "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY;";

pub const SNAPSHOT_QUERY: &str = "SELECT 1;";
