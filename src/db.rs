// ==========================================
// Sistema MES - Inicialização de conexão SQLite
// ==========================================
// Objetivos:
// - Unificar o comportamento de PRAGMA em todos os Connection::open,
//   evitando "chave estrangeira ligada em um módulo e desligada em outro"
// - Unificar busy_timeout, reduzindo erros busy esporádicos sob escrita concorrente
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// busy_timeout padrão (milissegundos)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Aplica os PRAGMA unificados a uma conexão SQLite
///
/// Observação:
/// - foreign_keys precisa ser ligado por conexão
/// - busy_timeout precisa ser configurado por conexão
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Abre uma conexão SQLite com a configuração unificada
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Abre uma conexão compartilhável entre repositórios
pub fn open_shared_connection(db_path: &str) -> rusqlite::Result<Arc<Mutex<Connection>>> {
    Ok(Arc::new(Mutex::new(open_sqlite_connection(db_path)?)))
}
