// ==========================================
// Sistema MES - Repositório de lotes
// ==========================================
// Responsabilidade: lotes e o snapshot de rota de cada lote
// Tabelas: lotes, fase_lotes
// Regra: fase_lotes é cópia da rota no momento da criação do lote;
// edições posteriores na rota do produto não alcançam lotes em andamento
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::LoteStatus;
use crate::domain::{FaseLote, Lote, RotaFase};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct LoteRepository {
    conn: Arc<Mutex<Connection>>,
}

fn mapear_lote(row: &Row<'_>) -> SqliteResult<Lote> {
    let status_txt: String = row.get(4)?;
    let status = LoteStatus::from_str(&status_txt).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Lote {
        id: row.get(0)?,
        codigo: row.get(1)?,
        produto_id: row.get(2)?,
        quantidade: row.get(3)?,
        status,
        prioridade: row.get(5)?,
        data_criacao: row.get(6)?,
        observacoes: row.get(7)?,
        ativo: row.get(8)?,
    })
}

const COLUNAS_LOTE: &str =
    "id, codigo, produto_id, quantidade, status, prioridade, data_criacao, observacoes, ativo";

impl LoteRepository {
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

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS lotes (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              codigo TEXT NOT NULL UNIQUE,
              produto_id INTEGER NOT NULL,
              quantidade INTEGER NOT NULL DEFAULT 1,
              status TEXT NOT NULL DEFAULT 'PENDENTE',
              prioridade INTEGER NOT NULL DEFAULT 0,
              data_criacao TEXT NOT NULL,
              observacoes TEXT,
              ativo INTEGER NOT NULL DEFAULT 1,
              FOREIGN KEY (produto_id) REFERENCES produtos(id)
            );

            CREATE TABLE IF NOT EXISTS fase_lotes (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              lote_id INTEGER NOT NULL,
              fase_id INTEGER NOT NULL,
              snapshot_id TEXT NOT NULL,
              ordem INTEGER NOT NULL,
              tempo_estimado_minutos INTEGER NOT NULL DEFAULT 0,
              tempo_prateleira_horas INTEGER,
              FOREIGN KEY (lote_id) REFERENCES lotes(id),
              FOREIGN KEY (fase_id) REFERENCES fases(id),
              UNIQUE(lote_id, ordem),
              UNIQUE(lote_id, fase_id)
            );

            CREATE INDEX IF NOT EXISTS idx_fase_lotes_lote
              ON fase_lotes(lote_id, ordem);
            CREATE INDEX IF NOT EXISTS idx_lotes_status
              ON lotes(status);
            "#,
        )?;
        Ok(())
    }

    /// Cria um lote e copia a rota recebida para fase_lotes (snapshot)
    ///
    /// Rota vazia é rejeitada: lote sem fases não é um lote produzível.
    pub fn criar(
        &self,
        codigo: &str,
        produto_id: i64,
        quantidade: i64,
        prioridade: bool,
        rota: &[RotaFase],
    ) -> RepositoryResult<Lote> {
        if rota.is_empty() {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "produto {} não possui rota definida; lote não pode ser criado",
                produto_id
            )));
        }
        if quantidade <= 0 {
            return Err(RepositoryError::FieldValueError {
                field: "quantidade".to_string(),
                message: "quantidade deve ser positiva".to_string(),
            });
        }

        let agora = Utc::now().naive_utc();
        let snapshot_id = Uuid::new_v4().to_string();

        let mut guard = self.get_conn()?;
        let tx = guard
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO lotes (codigo, produto_id, quantidade, status, prioridade, data_criacao)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                codigo,
                produto_id,
                quantidade,
                LoteStatus::Pendente.to_string(),
                prioridade,
                agora,
            ],
        )?;
        let lote_id = tx.last_insert_rowid();

        for entrada in rota {
            tx.execute(
                "INSERT INTO fase_lotes
                   (lote_id, fase_id, snapshot_id, ordem, tempo_estimado_minutos, tempo_prateleira_horas)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    lote_id,
                    entrada.fase_id,
                    snapshot_id,
                    entrada.ordem,
                    entrada.tempo_estimado_minutos,
                    entrada.tempo_prateleira_horas,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(Lote {
            id: lote_id,
            codigo: codigo.to_string(),
            produto_id,
            quantidade,
            status: LoteStatus::Pendente,
            prioridade,
            data_criacao: agora,
            observacoes: None,
            ativo: true,
        })
    }

    pub fn buscar(&self, lote_id: i64) -> RepositoryResult<Option<Lote>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM lotes WHERE id = ?1", COLUNAS_LOTE))?;
        match stmt.query_row(params![lote_id], mapear_lote) {
            Ok(l) => Ok(Some(l)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn buscar_por_codigo(&self, codigo: &str) -> RepositoryResult<Option<Lote>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM lotes WHERE codigo = ?1", COLUNAS_LOTE))?;
        match stmt.query_row(params![codigo], mapear_lote) {
            Ok(l) => Ok(Some(l)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fases do lote (snapshot) em ordem crescente
    pub fn fases_do_lote(&self, lote_id: i64) -> RepositoryResult<Vec<FaseLote>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, lote_id, fase_id, snapshot_id, ordem,
                    tempo_estimado_minutos, tempo_prateleira_horas
             FROM fase_lotes
             WHERE lote_id = ?1
             ORDER BY ordem ASC",
        )?;
        let rows = stmt
            .query_map(params![lote_id], |row| {
                Ok(FaseLote {
                    id: row.get(0)?,
                    lote_id: row.get(1)?,
                    fase_id: row.get(2)?,
                    snapshot_id: row.get(3)?,
                    ordem: row.get(4)?,
                    tempo_estimado_minutos: row.get(5)?,
                    tempo_prateleira_horas: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn atualizar_status(&self, lote_id: i64, status: LoteStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let afetados = conn.execute(
            "UPDATE lotes SET status = ?2 WHERE id = ?1",
            params![lote_id, status.to_string()],
        )?;
        if afetados == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Lote".to_string(),
                id: lote_id.to_string(),
            });
        }
        Ok(())
    }

    /// Lotes disponíveis para apontamento (pendentes, em produção ou em pausa)
    pub fn listar_disponiveis(&self) -> RepositoryResult<Vec<Lote>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM lotes
             WHERE ativo = 1 AND status IN ('PENDENTE', 'EM_PRODUCAO', 'EM_PAUSA')
             ORDER BY prioridade DESC, data_criacao DESC",
            COLUNAS_LOTE
        ))?;
        let rows = stmt
            .query_map([], mapear_lote)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

/// Momento atual em UTC (padronizado para toda a camada)
pub fn agora_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}
