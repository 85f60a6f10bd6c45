// ==========================================
// Sistema MES - Gerenciador de configuração
// ==========================================
// Persistência chave/valor na tabela config_producao
// ==========================================

use crate::config::config_reader::ConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_producao (
              chave TEXT PRIMARY KEY,
              valor TEXT NOT NULL,
              atualizado_em TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Define (ou sobrescreve) uma chave de configuração
    pub fn definir(&self, chave: &str, valor: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_producao (chave, valor, atualizado_em)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(chave) DO UPDATE SET
               valor = excluded.valor,
               atualizado_em = excluded.atualizado_em",
            params![chave, valor, Utc::now().naive_utc()],
        )?;
        Ok(())
    }

    /// Leitura síncrona (uso interno e pelo binário)
    pub fn obter_sync(&self, chave: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT valor FROM config_producao WHERE chave = ?1")?;
        match stmt.query_row(params![chave], |row| row.get::<_, String>(0)) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ConfigReader for ConfigManager {
    async fn obter(&self, chave: &str) -> anyhow::Result<Option<String>> {
        Ok(self.obter_sync(chave)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_reader::CHAVE_POLITICA_MAQUINA;
    use crate::domain::types::PoliticaMaquina;

    #[tokio::test]
    async fn test_definir_e_obter() {
        let manager = ConfigManager::new(":memory:").unwrap();
        assert!(manager.obter("inexistente").await.unwrap().is_none());

        manager.definir(CHAVE_POLITICA_MAQUINA, "OBRIGATORIA").unwrap();
        assert_eq!(
            manager.politica_maquina().await.unwrap(),
            PoliticaMaquina::Obrigatoria
        );

        // sobrescrita
        manager.definir(CHAVE_POLITICA_MAQUINA, "OPCIONAL").unwrap();
        assert_eq!(
            manager.politica_maquina().await.unwrap(),
            PoliticaMaquina::Opcional
        );
    }
}
