// ==========================================
// Sistema MES - Repositório de apontamentos
// ==========================================
// Responsabilidade: apontamentos e respostas de checklist
// Tabelas: apontamentos, checklist_respostas
//
// Controle de concorrência: o índice único parcial
// (lote_id, fase_id) WHERE status='INICIADO' faz do INSERT de
// abertura uma verificação-e-inserção atômica. Dois iniciar()
// disputando a mesma fase: um vence, o outro recebe violação
// de unicidade. Nunca ler-e-depois-escrever.
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::ApontamentoStatus;
use crate::domain::{Apontamento, ChecklistResposta};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub struct ApontamentoRepository {
    conn: Arc<Mutex<Connection>>,
}

fn mapear_apontamento(row: &Row<'_>) -> SqliteResult<Apontamento> {
    let status_txt: String = row.get(6)?;
    let status = ApontamentoStatus::from_str(&status_txt).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Apontamento {
        id: row.get(0)?,
        lote_id: row.get(1)?,
        produto_id: row.get(2)?,
        fase_id: row.get(3)?,
        operador_id: row.get(4)?,
        maquina_id: row.get(5)?,
        status,
        data_inicio: row.get(7)?,
        data_fim: row.get(8)?,
        tempo_real_minutos: row.get(9)?,
        excedeu_tempo: row.get(10)?,
        minutos_atraso: row.get(11)?,
        observacoes: row.get(12)?,
    })
}

const COLUNAS: &str = "id, lote_id, produto_id, fase_id, operador_id, maquina_id, status, \
                       data_inicio, data_fim, tempo_real_minutos, excedeu_tempo, minutos_atraso, \
                       observacoes";

impl ApontamentoRepository {
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
            CREATE TABLE IF NOT EXISTS apontamentos (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              lote_id INTEGER NOT NULL,
              produto_id INTEGER NOT NULL,
              fase_id INTEGER NOT NULL,
              operador_id INTEGER NOT NULL,
              maquina_id INTEGER,
              status TEXT NOT NULL,
              data_inicio TEXT NOT NULL,
              data_fim TEXT,
              tempo_real_minutos INTEGER,
              excedeu_tempo INTEGER NOT NULL DEFAULT 0,
              minutos_atraso INTEGER NOT NULL DEFAULT 0,
              observacoes TEXT,
              FOREIGN KEY (lote_id) REFERENCES lotes(id),
              FOREIGN KEY (produto_id) REFERENCES produtos(id),
              FOREIGN KEY (fase_id) REFERENCES fases(id),
              FOREIGN KEY (maquina_id) REFERENCES maquinas(id)
            );

            -- no máximo um apontamento aberto por (lote, fase)
            CREATE UNIQUE INDEX IF NOT EXISTS idx_apontamento_aberto
              ON apontamentos(lote_id, fase_id) WHERE status = 'INICIADO';

            CREATE INDEX IF NOT EXISTS idx_apontamentos_lote
              ON apontamentos(lote_id, fase_id);
            CREATE INDEX IF NOT EXISTS idx_apontamentos_operador
              ON apontamentos(operador_id, data_inicio DESC);

            CREATE TABLE IF NOT EXISTS checklist_respostas (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              apontamento_id INTEGER NOT NULL,
              checklist_item_id INTEGER NOT NULL,
              concluido INTEGER NOT NULL DEFAULT 0,
              observacao TEXT,
              data_resposta TEXT NOT NULL,
              FOREIGN KEY (apontamento_id) REFERENCES apontamentos(id),
              FOREIGN KEY (checklist_item_id) REFERENCES checklist_items(id),
              UNIQUE(apontamento_id, checklist_item_id)
            );
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // Apontamentos
    // ==========================================

    /// Insere um apontamento INICIADO
    ///
    /// O INSERT é protegido pelo índice único parcial; se já houver
    /// apontamento aberto para (lote, fase), retorna
    /// `UniqueConstraintViolation` sem criar registro.
    pub fn inserir_iniciado(
        &self,
        lote_id: i64,
        produto_id: i64,
        fase_id: i64,
        operador_id: i64,
        maquina_id: Option<i64>,
        observacoes: Option<&str>,
    ) -> RepositoryResult<Apontamento> {
        let agora = Utc::now().naive_utc();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO apontamentos
               (lote_id, produto_id, fase_id, operador_id, maquina_id, status, data_inicio, observacoes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                lote_id,
                produto_id,
                fase_id,
                operador_id,
                maquina_id,
                ApontamentoStatus::Iniciado.to_string(),
                agora,
                observacoes,
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Apontamento {
            id,
            lote_id,
            produto_id,
            fase_id,
            operador_id,
            maquina_id,
            status: ApontamentoStatus::Iniciado,
            data_inicio: agora,
            data_fim: None,
            tempo_real_minutos: None,
            excedeu_tempo: false,
            minutos_atraso: 0,
            observacoes: observacoes.map(|s| s.to_string()),
        })
    }

    pub fn buscar(&self, apontamento_id: i64) -> RepositoryResult<Option<Apontamento>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM apontamentos WHERE id = ?1", COLUNAS))?;
        match stmt.query_row(params![apontamento_id], mapear_apontamento) {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apontamento aberto de uma fase do lote, se houver
    pub fn aberto_da_fase(
        &self,
        lote_id: i64,
        fase_id: i64,
    ) -> RepositoryResult<Option<Apontamento>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM apontamentos
             WHERE lote_id = ?1 AND fase_id = ?2 AND status = 'INICIADO'",
            COLUNAS
        ))?;
        match stmt.query_row(params![lote_id, fase_id], mapear_apontamento) {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apontamento aberto do operador, se houver (um operador por vez)
    pub fn aberto_do_operador(&self, operador_id: i64) -> RepositoryResult<Option<Apontamento>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM apontamentos
             WHERE operador_id = ?1 AND status = 'INICIADO'
             LIMIT 1",
            COLUNAS
        ))?;
        match stmt.query_row(params![operador_id], mapear_apontamento) {
            Ok(a) => Ok(Some(a)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Todos os apontamentos de um lote (entrada do cálculo de progressão)
    pub fn listar_do_lote(&self, lote_id: i64) -> RepositoryResult<Vec<Apontamento>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM apontamentos WHERE lote_id = ?1 ORDER BY data_inicio ASC",
            COLUNAS
        ))?;
        let rows = stmt
            .query_map(params![lote_id], mapear_apontamento)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Histórico de apontamentos do operador, mais recente primeiro
    pub fn historico_do_operador(
        &self,
        operador_id: i64,
        limit: usize,
    ) -> RepositoryResult<Vec<Apontamento>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM apontamentos
             WHERE operador_id = ?1
             ORDER BY data_inicio DESC
             LIMIT ?2",
            COLUNAS
        ))?;
        let rows = stmt
            .query_map(params![operador_id, limit as i64], mapear_apontamento)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Finaliza um apontamento aberto
    ///
    /// UPDATE condicionado a status='INICIADO': uma segunda finalização
    /// afeta zero linhas, e o chamador trata como estado inválido.
    /// Retorna o número de linhas afetadas (0 ou 1).
    #[allow(clippy::too_many_arguments)]
    pub fn finalizar(
        &self,
        apontamento_id: i64,
        data_fim: NaiveDateTime,
        tempo_real_minutos: i64,
        excedeu_tempo: bool,
        minutos_atraso: i64,
        observacoes: Option<&str>,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let afetados = conn.execute(
            "UPDATE apontamentos
             SET status = 'FINALIZADO',
                 data_fim = ?2,
                 tempo_real_minutos = ?3,
                 excedeu_tempo = ?4,
                 minutos_atraso = ?5,
                 observacoes = COALESCE(?6, observacoes)
             WHERE id = ?1 AND status = 'INICIADO'",
            params![
                apontamento_id,
                data_fim,
                tempo_real_minutos,
                excedeu_tempo,
                minutos_atraso,
                observacoes,
            ],
        )?;
        Ok(afetados)
    }

    // ==========================================
    // Respostas de checklist
    // ==========================================

    /// Registra (ou atualiza) a resposta de um item do checklist
    ///
    /// Upsert por (apontamento, item); a última escrita vence.
    pub fn responder_checklist(
        &self,
        apontamento_id: i64,
        checklist_item_id: i64,
        concluido: bool,
        observacao: Option<&str>,
    ) -> RepositoryResult<ChecklistResposta> {
        let agora = Utc::now().naive_utc();
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO checklist_respostas
               (apontamento_id, checklist_item_id, concluido, observacao, data_resposta)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(apontamento_id, checklist_item_id) DO UPDATE SET
               concluido = excluded.concluido,
               observacao = excluded.observacao,
               data_resposta = excluded.data_resposta",
            params![apontamento_id, checklist_item_id, concluido, observacao, agora],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, apontamento_id, checklist_item_id, concluido, observacao, data_resposta
             FROM checklist_respostas
             WHERE apontamento_id = ?1 AND checklist_item_id = ?2",
        )?;
        let resposta = stmt.query_row(params![apontamento_id, checklist_item_id], |row| {
            Ok(ChecklistResposta {
                id: row.get(0)?,
                apontamento_id: row.get(1)?,
                checklist_item_id: row.get(2)?,
                concluido: row.get(3)?,
                observacao: row.get(4)?,
                data_resposta: row.get(5)?,
            })
        })?;
        Ok(resposta)
    }

    /// Respostas registradas para um apontamento
    pub fn respostas_do_apontamento(
        &self,
        apontamento_id: i64,
    ) -> RepositoryResult<Vec<ChecklistResposta>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, apontamento_id, checklist_item_id, concluido, observacao, data_resposta
             FROM checklist_respostas
             WHERE apontamento_id = ?1
             ORDER BY checklist_item_id ASC",
        )?;
        let rows = stmt
            .query_map(params![apontamento_id], |row| {
                Ok(ChecklistResposta {
                    id: row.get(0)?,
                    apontamento_id: row.get(1)?,
                    checklist_item_id: row.get(2)?,
                    concluido: row.get(3)?,
                    observacao: row.get(4)?,
                    data_resposta: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ApontamentoRepository {
        // sem foreign_keys: os testes exercitam só esta tabela
        // (o SQLite bundled liga foreign_keys por padrão, então desligamos explicitamente)
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        let conn = Arc::new(Mutex::new(conn));
        ApontamentoRepository::from_connection(conn).unwrap()
    }

    #[test]
    fn test_inserir_e_buscar() {
        let repo = setup();
        let apont = repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();

        let lido = repo.buscar(apont.id).unwrap().unwrap();
        assert_eq!(lido.status, ApontamentoStatus::Iniciado);
        assert_eq!(lido.fase_id, 10);
        assert!(lido.data_fim.is_none());
    }

    #[test]
    fn test_indice_unico_parcial_bloqueia_segundo_aberto() {
        let repo = setup();
        repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();

        let err = repo.inserir_iniciado(1, 1, 10, 200, None, None).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

        // fase diferente do mesmo lote não conflita
        repo.inserir_iniciado(1, 1, 11, 200, None, None).unwrap();
    }

    #[test]
    fn test_finalizar_apenas_uma_vez() {
        let repo = setup();
        let apont = repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();
        let fim = Utc::now().naive_utc();

        let afetados = repo
            .finalizar(apont.id, fim, 42, false, 0, Some("ok"))
            .unwrap();
        assert_eq!(afetados, 1);

        // segunda finalização não afeta nenhuma linha
        let afetados = repo.finalizar(apont.id, fim, 42, false, 0, None).unwrap();
        assert_eq!(afetados, 0);

        let lido = repo.buscar(apont.id).unwrap().unwrap();
        assert_eq!(lido.status, ApontamentoStatus::Finalizado);
        assert_eq!(lido.tempo_real_minutos, Some(42));
        assert_eq!(lido.observacoes.as_deref(), Some("ok"));
    }

    #[test]
    fn test_apos_finalizar_fase_pode_reabrir() {
        let repo = setup();
        let primeiro = repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();
        repo.finalizar(primeiro.id, Utc::now().naive_utc(), 5, false, 0, None)
            .unwrap();

        // retrabalho: novo apontamento aberto para a mesma fase
        let segundo = repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();
        assert_ne!(primeiro.id, segundo.id);
    }

    #[test]
    fn test_responder_checklist_upsert() {
        let repo = setup();
        let apont = repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();

        let r1 = repo
            .responder_checklist(apont.id, 7, false, Some("pendente"))
            .unwrap();
        assert!(!r1.concluido);

        // última escrita vence
        let r2 = repo.responder_checklist(apont.id, 7, true, None).unwrap();
        assert!(r2.concluido);
        assert_eq!(r1.id, r2.id);

        let respostas = repo.respostas_do_apontamento(apont.id).unwrap();
        assert_eq!(respostas.len(), 1);
        assert!(respostas[0].concluido);
    }

    #[test]
    fn test_aberto_do_operador() {
        let repo = setup();
        assert!(repo.aberto_do_operador(100).unwrap().is_none());

        let apont = repo.inserir_iniciado(1, 1, 10, 100, None, None).unwrap();
        let aberto = repo.aberto_do_operador(100).unwrap().unwrap();
        assert_eq!(aberto.id, apont.id);

        repo.finalizar(apont.id, Utc::now().naive_utc(), 1, false, 0, None)
            .unwrap();
        assert!(repo.aberto_do_operador(100).unwrap().is_none());
    }
}
