// ==========================================
// Sistema MES - Repositório de fases
// ==========================================
// Responsabilidade: catálogo de fases e modelos de checklist
// Tabelas: fases, checklist_items
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{ChecklistItem, Fase};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct FaseRepository {
    conn: Arc<Mutex<Connection>>,
}

fn mapear_fase(row: &Row<'_>) -> SqliteResult<Fase> {
    Ok(Fase {
        id: row.get(0)?,
        codigo: row.get(1)?,
        nome: row.get(2)?,
        tempo_estimado_minutos: row.get(3)?,
        requer_aprovacao: row.get(4)?,
        ativo: row.get(5)?,
    })
}

fn mapear_item(row: &Row<'_>) -> SqliteResult<ChecklistItem> {
    Ok(ChecklistItem {
        id: row.get(0)?,
        fase_id: row.get(1)?,
        descricao: row.get(2)?,
        obrigatorio: row.get(3)?,
        ordem: row.get(4)?,
        ativo: row.get(5)?,
    })
}

const COLUNAS_FASE: &str = "id, codigo, nome, tempo_estimado_minutos, requer_aprovacao, ativo";
const COLUNAS_ITEM: &str = "id, fase_id, descricao, obrigatorio, ordem, ativo";

impl FaseRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Garante as tabelas (cria se não existirem)
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS fases (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              codigo TEXT NOT NULL UNIQUE,
              nome TEXT NOT NULL,
              tempo_estimado_minutos INTEGER NOT NULL DEFAULT 0,
              requer_aprovacao INTEGER NOT NULL DEFAULT 0,
              ativo INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS checklist_items (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              fase_id INTEGER NOT NULL,
              descricao TEXT NOT NULL,
              obrigatorio INTEGER NOT NULL DEFAULT 1,
              ordem INTEGER NOT NULL DEFAULT 1,
              ativo INTEGER NOT NULL DEFAULT 1,
              FOREIGN KEY (fase_id) REFERENCES fases(id)
            );

            CREATE INDEX IF NOT EXISTS idx_checklist_items_fase
              ON checklist_items(fase_id, ordem);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // Fases
    // ==========================================

    /// Insere uma fase e retorna o registro com o id gerado
    pub fn inserir(
        &self,
        codigo: &str,
        nome: &str,
        tempo_estimado_minutos: i64,
        requer_aprovacao: bool,
    ) -> RepositoryResult<Fase> {
        if codigo.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "codigo".to_string(),
                message: "código de fase não pode ser vazio".to_string(),
            });
        }
        if tempo_estimado_minutos < 0 {
            return Err(RepositoryError::FieldValueError {
                field: "tempo_estimado_minutos".to_string(),
                message: "estimativa não pode ser negativa".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO fases (codigo, nome, tempo_estimado_minutos, requer_aprovacao)
             VALUES (?1, ?2, ?3, ?4)",
            params![codigo, nome, tempo_estimado_minutos, requer_aprovacao],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Fase {
            id,
            codigo: codigo.to_string(),
            nome: nome.to_string(),
            tempo_estimado_minutos,
            requer_aprovacao,
            ativo: true,
        })
    }

    pub fn buscar(&self, fase_id: i64) -> RepositoryResult<Option<Fase>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM fases WHERE id = ?1", COLUNAS_FASE))?;
        match stmt.query_row(params![fase_id], mapear_fase) {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn buscar_por_codigo(&self, codigo: &str) -> RepositoryResult<Option<Fase>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM fases WHERE codigo = ?1", COLUNAS_FASE))?;
        match stmt.query_row(params![codigo], mapear_fase) {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Lista as fases ativas ordenadas por código
    pub fn listar_ativas(&self) -> RepositoryResult<Vec<Fase>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM fases WHERE ativo = 1 ORDER BY codigo ASC",
            COLUNAS_FASE
        ))?;
        let rows = stmt
            .query_map([], mapear_fase)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Exclusão lógica
    pub fn desativar(&self, fase_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let afetados = conn.execute("UPDATE fases SET ativo = 0 WHERE id = ?1", params![fase_id])?;
        if afetados == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Fase".to_string(),
                id: fase_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // Checklist
    // ==========================================

    pub fn inserir_item_checklist(
        &self,
        fase_id: i64,
        descricao: &str,
        obrigatorio: bool,
        ordem: i64,
    ) -> RepositoryResult<ChecklistItem> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO checklist_items (fase_id, descricao, obrigatorio, ordem)
             VALUES (?1, ?2, ?3, ?4)",
            params![fase_id, descricao, obrigatorio, ordem],
        )?;
        let id = conn.last_insert_rowid();

        Ok(ChecklistItem {
            id,
            fase_id,
            descricao: descricao.to_string(),
            obrigatorio,
            ordem,
            ativo: true,
        })
    }

    pub fn buscar_item_checklist(&self, item_id: i64) -> RepositoryResult<Option<ChecklistItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM checklist_items WHERE id = ?1",
            COLUNAS_ITEM
        ))?;
        match stmt.query_row(params![item_id], mapear_item) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Itens de checklist ativos de uma fase, em ordem
    pub fn itens_checklist_da_fase(&self, fase_id: i64) -> RepositoryResult<Vec<ChecklistItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM checklist_items
             WHERE fase_id = ?1 AND ativo = 1
             ORDER BY ordem ASC",
            COLUNAS_ITEM
        ))?;
        let rows = stmt
            .query_map(params![fase_id], mapear_item)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Somente os itens obrigatórios (os que bloqueiam a finalização)
    pub fn itens_obrigatorios_da_fase(&self, fase_id: i64) -> RepositoryResult<Vec<ChecklistItem>> {
        Ok(self
            .itens_checklist_da_fase(fase_id)?
            .into_iter()
            .filter(|item| item.obrigatorio)
            .collect())
    }
}
