// ==========================================
// Sistema MES - Repositório de máquinas
// ==========================================
// Responsabilidade: máquinas associadas (ordenadas) às fases
// Tabela: maquinas
// A ordem dentro da fase define preferência, não exclusividade
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::MaquinaStatus;
use crate::domain::Maquina;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub struct MaquinaRepository {
    conn: Arc<Mutex<Connection>>,
}

fn mapear_maquina(row: &Row<'_>) -> SqliteResult<Maquina> {
    let status_txt: String = row.get(5)?;
    let status = MaquinaStatus::from_str(&status_txt).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Maquina {
        id: row.get(0)?,
        codigo: row.get(1)?,
        nome: row.get(2)?,
        fase_id: row.get(3)?,
        ordem: row.get(4)?,
        status,
        qrcode: row.get(6)?,
    })
}

const COLUNAS: &str = "id, codigo, nome, fase_id, ordem, status, qrcode";

impl MaquinaRepository {
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
            CREATE TABLE IF NOT EXISTS maquinas (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              codigo TEXT NOT NULL UNIQUE,
              nome TEXT NOT NULL,
              fase_id INTEGER NOT NULL,
              ordem INTEGER NOT NULL DEFAULT 1,
              status TEXT NOT NULL DEFAULT 'ATIVA',
              qrcode TEXT,
              FOREIGN KEY (fase_id) REFERENCES fases(id)
            );

            CREATE INDEX IF NOT EXISTS idx_maquinas_fase
              ON maquinas(fase_id, ordem);
            "#,
        )?;
        Ok(())
    }

    pub fn inserir(
        &self,
        codigo: &str,
        nome: &str,
        fase_id: i64,
        ordem: i64,
    ) -> RepositoryResult<Maquina> {
        let qrcode = format!("maquina:{}", codigo);
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO maquinas (codigo, nome, fase_id, ordem, status, qrcode)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                codigo,
                nome,
                fase_id,
                ordem,
                MaquinaStatus::Ativa.to_string(),
                qrcode,
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Maquina {
            id,
            codigo: codigo.to_string(),
            nome: nome.to_string(),
            fase_id,
            ordem,
            status: MaquinaStatus::Ativa,
            qrcode: Some(qrcode),
        })
    }

    pub fn buscar(&self, maquina_id: i64) -> RepositoryResult<Option<Maquina>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM maquinas WHERE id = ?1", COLUNAS))?;
        match stmt.query_row(params![maquina_id], mapear_maquina) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn buscar_por_codigo(&self, codigo: &str) -> RepositoryResult<Option<Maquina>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM maquinas WHERE codigo = ?1", COLUNAS))?;
        match stmt.query_row(params![codigo], mapear_maquina) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Máquinas de uma fase em ordem de preferência (inclui inativas)
    pub fn listar_da_fase(&self, fase_id: i64) -> RepositoryResult<Vec<Maquina>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM maquinas WHERE fase_id = ?1 ORDER BY ordem ASC, codigo ASC",
            COLUNAS
        ))?;
        let rows = stmt
            .query_map(params![fase_id], mapear_maquina)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn atualizar_status(&self, maquina_id: i64, status: MaquinaStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let afetados = conn.execute(
            "UPDATE maquinas SET status = ?2 WHERE id = ?1",
            params![maquina_id, status.to_string()],
        )?;
        if afetados == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Maquina".to_string(),
                id: maquina_id.to_string(),
            });
        }
        Ok(())
    }

    /// Reordena as máquinas de uma fase (arrastar-e-soltar na tela de admin)
    ///
    /// Recebe os ids na nova ordem; cada máquina ganha ordem = posição + 1.
    /// Ids que não pertencem à fase são rejeitados.
    pub fn reordenar_fase(&self, fase_id: i64, ids_em_ordem: &[i64]) -> RepositoryResult<()> {
        let mut guard = self.get_conn()?;
        let tx = guard
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for (posicao, maquina_id) in ids_em_ordem.iter().enumerate() {
            let afetados = tx.execute(
                "UPDATE maquinas SET ordem = ?3 WHERE id = ?1 AND fase_id = ?2",
                params![maquina_id, fase_id, (posicao as i64) + 1],
            )?;
            if afetados == 0 {
                return Err(RepositoryError::ValidationError(format!(
                    "máquina {} não pertence à fase {}",
                    maquina_id, fase_id
                )));
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fase_repo::FaseRepository;

    fn setup() -> (MaquinaRepository, i64) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let fases = FaseRepository::from_connection(conn.clone()).unwrap();
        let fase = fases.inserir("USINAGEM", "Usinagem", 90, false).unwrap();
        let maquinas = MaquinaRepository::from_connection(conn).unwrap();
        (maquinas, fase.id)
    }

    #[test]
    fn test_inserir_gera_qrcode() {
        let (repo, fase_id) = setup();
        let maquina = repo.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();
        assert_eq!(maquina.qrcode.as_deref(), Some("maquina:TRN-01"));
        assert_eq!(maquina.status, MaquinaStatus::Ativa);
    }

    #[test]
    fn test_listar_da_fase_ordenado() {
        let (repo, fase_id) = setup();
        repo.inserir("TRN-02", "Torno 02", fase_id, 2).unwrap();
        repo.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();
        repo.inserir("FRS-01", "Fresa 01", fase_id, 3).unwrap();

        let lista = repo.listar_da_fase(fase_id).unwrap();
        assert_eq!(lista.len(), 3);
        assert_eq!(lista[0].codigo, "TRN-01");
        assert_eq!(lista[2].codigo, "FRS-01");
    }

    #[test]
    fn test_reordenar_fase() {
        let (repo, fase_id) = setup();
        let a = repo.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();
        let b = repo.inserir("TRN-02", "Torno 02", fase_id, 2).unwrap();

        repo.reordenar_fase(fase_id, &[b.id, a.id]).unwrap();
        let lista = repo.listar_da_fase(fase_id).unwrap();
        assert_eq!(lista[0].id, b.id);
        assert_eq!(lista[0].ordem, 1);
        assert_eq!(lista[1].ordem, 2);
    }

    #[test]
    fn test_reordenar_com_id_de_outra_fase() {
        let (repo, fase_id) = setup();
        repo.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();

        let err = repo.reordenar_fase(fase_id, &[12345]).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));
    }

    #[test]
    fn test_atualizar_status() {
        let (repo, fase_id) = setup();
        let maquina = repo.inserir("TRN-01", "Torno 01", fase_id, 1).unwrap();

        repo.atualizar_status(maquina.id, MaquinaStatus::Manutencao).unwrap();
        let lida = repo.buscar(maquina.id).unwrap().unwrap();
        assert_eq!(lida.status, MaquinaStatus::Manutencao);
    }
}
