// ==========================================
// Sistema MES - Repositório de produtos e rotas
// ==========================================
// Responsabilidade: produtos e suas rotas de produção
// Tabelas: produtos, produto_fases
// Regra: rota malformada é rejeitada antes de poder ser anexada
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{Produto, RotaFase};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Violação encontrada na validação de uma rota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotaInvalidaDetalhe {
    pub fase_id: i64,
    pub ordem: i64,
    pub motivo: String,
}

pub struct ProdutoRepository {
    conn: Arc<Mutex<Connection>>,
}

fn mapear_produto(row: &Row<'_>) -> SqliteResult<Produto> {
    Ok(Produto {
        id: row.get(0)?,
        codigo: row.get(1)?,
        descricao: row.get(2)?,
        ativo: row.get(3)?,
    })
}

impl ProdutoRepository {
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
            CREATE TABLE IF NOT EXISTS produtos (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              codigo TEXT NOT NULL UNIQUE,
              descricao TEXT NOT NULL,
              ativo INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS produto_fases (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              produto_id INTEGER NOT NULL,
              fase_id INTEGER NOT NULL,
              ordem INTEGER NOT NULL,
              tempo_estimado_minutos INTEGER NOT NULL DEFAULT 0,
              tempo_prateleira_horas INTEGER,
              FOREIGN KEY (produto_id) REFERENCES produtos(id),
              FOREIGN KEY (fase_id) REFERENCES fases(id),
              UNIQUE(produto_id, ordem),
              UNIQUE(produto_id, fase_id)
            );

            CREATE INDEX IF NOT EXISTS idx_produto_fases_produto
              ON produto_fases(produto_id, ordem);
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // Produtos
    // ==========================================

    pub fn inserir(&self, codigo: &str, descricao: &str) -> RepositoryResult<Produto> {
        if codigo.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "codigo".to_string(),
                message: "código de produto não pode ser vazio".to_string(),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO produtos (codigo, descricao) VALUES (?1, ?2)",
            params![codigo, descricao],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Produto {
            id,
            codigo: codigo.to_string(),
            descricao: descricao.to_string(),
            ativo: true,
        })
    }

    pub fn buscar(&self, produto_id: i64) -> RepositoryResult<Option<Produto>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, codigo, descricao, ativo FROM produtos WHERE id = ?1")?;
        match stmt.query_row(params![produto_id], mapear_produto) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn buscar_por_codigo(&self, codigo: &str) -> RepositoryResult<Option<Produto>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, codigo, descricao, ativo FROM produtos WHERE codigo = ?1")?;
        match stmt.query_row(params![codigo], mapear_produto) {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn listar_ativos(&self) -> RepositoryResult<Vec<Produto>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, codigo, descricao, ativo FROM produtos WHERE ativo = 1 ORDER BY codigo",
        )?;
        let rows = stmt
            .query_map([], mapear_produto)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // Rotas
    // ==========================================

    /// Valida uma rota sem gravá-la
    ///
    /// Regras:
    /// - ordem: inteiros positivos, únicos dentro da rota
    /// - fase_id: deve referenciar fase ativa do catálogo
    /// - tempo_estimado_minutos >= 0
    ///
    /// Retorna a lista de violações (vazia quando a rota é válida)
    pub fn validar_rota(&self, entradas: &[RotaFase]) -> RepositoryResult<Vec<RotaInvalidaDetalhe>> {
        let mut violacoes = Vec::new();
        let mut ordens_vistas: HashSet<i64> = HashSet::new();
        let mut fases_vistas: HashSet<i64> = HashSet::new();

        let conn = self.get_conn()?;
        let mut stmt_fase = conn.prepare("SELECT ativo FROM fases WHERE id = ?1")?;

        for entrada in entradas {
            if entrada.ordem <= 0 {
                violacoes.push(RotaInvalidaDetalhe {
                    fase_id: entrada.fase_id,
                    ordem: entrada.ordem,
                    motivo: "ordem deve ser inteiro positivo".to_string(),
                });
            } else if !ordens_vistas.insert(entrada.ordem) {
                violacoes.push(RotaInvalidaDetalhe {
                    fase_id: entrada.fase_id,
                    ordem: entrada.ordem,
                    motivo: "ordem repetida na rota".to_string(),
                });
            }

            if !fases_vistas.insert(entrada.fase_id) {
                violacoes.push(RotaInvalidaDetalhe {
                    fase_id: entrada.fase_id,
                    ordem: entrada.ordem,
                    motivo: "fase repetida na rota".to_string(),
                });
            }

            if entrada.tempo_estimado_minutos < 0 {
                violacoes.push(RotaInvalidaDetalhe {
                    fase_id: entrada.fase_id,
                    ordem: entrada.ordem,
                    motivo: "tempo estimado não pode ser negativo".to_string(),
                });
            }

            let ativo: Option<bool> =
                match stmt_fase.query_row(params![entrada.fase_id], |row| row.get(0)) {
                    Ok(v) => Some(v),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                };
            match ativo {
                Some(true) => {}
                Some(false) => violacoes.push(RotaInvalidaDetalhe {
                    fase_id: entrada.fase_id,
                    ordem: entrada.ordem,
                    motivo: "fase está desativada no catálogo".to_string(),
                }),
                None => violacoes.push(RotaInvalidaDetalhe {
                    fase_id: entrada.fase_id,
                    ordem: entrada.ordem,
                    motivo: "fase inexistente no catálogo".to_string(),
                }),
            }
        }

        Ok(violacoes)
    }

    /// Grava a rota do produto (substitui a rota anterior)
    ///
    /// A rota só vale para lotes criados depois; lotes em andamento
    /// seguem o snapshot tirado na criação.
    pub fn anexar_rota(&self, produto_id: i64, entradas: &[RotaFase]) -> RepositoryResult<()> {
        let violacoes = self.validar_rota(entradas)?;
        if let Some(v) = violacoes.first() {
            return Err(RepositoryError::ValidationError(format!(
                "rota inválida: fase_id={} ordem={}: {}",
                v.fase_id, v.ordem, v.motivo
            )));
        }

        let mut guard = self.get_conn()?;
        let tx = guard
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "DELETE FROM produto_fases WHERE produto_id = ?1",
            params![produto_id],
        )?;
        for entrada in entradas {
            tx.execute(
                "INSERT INTO produto_fases
                   (produto_id, fase_id, ordem, tempo_estimado_minutos, tempo_prateleira_horas)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    produto_id,
                    entrada.fase_id,
                    entrada.ordem,
                    entrada.tempo_estimado_minutos,
                    entrada.tempo_prateleira_horas,
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// Rota do produto em ordem crescente
    pub fn rota_do_produto(&self, produto_id: i64) -> RepositoryResult<Vec<RotaFase>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT fase_id, ordem, tempo_estimado_minutos, tempo_prateleira_horas
             FROM produto_fases
             WHERE produto_id = ?1
             ORDER BY ordem ASC",
        )?;
        let rows = stmt
            .query_map(params![produto_id], |row| {
                Ok(RotaFase {
                    fase_id: row.get(0)?,
                    ordem: row.get(1)?,
                    tempo_estimado_minutos: row.get(2)?,
                    tempo_prateleira_horas: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fase_repo::FaseRepository;
    use rusqlite::Connection;

    fn setup() -> (ProdutoRepository, FaseRepository) {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let fases = FaseRepository::from_connection(conn.clone()).unwrap();
        let produtos = ProdutoRepository::from_connection(conn).unwrap();
        (produtos, fases)
    }

    #[test]
    fn test_anexar_e_ler_rota() {
        let (produtos, fases) = setup();
        let corte = fases.inserir("CORTE", "Corte", 30, false).unwrap();
        let solda = fases.inserir("SOLDA", "Solda", 60, false).unwrap();
        let produto = produtos.inserir("P-001", "Chapa dobrada").unwrap();

        let rota = vec![
            RotaFase::new(corte.id, 1, 30),
            RotaFase::new(solda.id, 2, 60),
        ];
        produtos.anexar_rota(produto.id, &rota).unwrap();

        let lida = produtos.rota_do_produto(produto.id).unwrap();
        assert_eq!(lida.len(), 2);
        assert_eq!(lida[0].fase_id, corte.id);
        assert_eq!(lida[1].ordem, 2);
    }

    #[test]
    fn test_validar_rota_ordem_repetida() {
        let (produtos, fases) = setup();
        let corte = fases.inserir("CORTE", "Corte", 30, false).unwrap();
        let solda = fases.inserir("SOLDA", "Solda", 60, false).unwrap();

        let rota = vec![
            RotaFase::new(corte.id, 1, 30),
            RotaFase::new(solda.id, 1, 60),
        ];
        let violacoes = produtos.validar_rota(&rota).unwrap();
        assert_eq!(violacoes.len(), 1);
        assert_eq!(violacoes[0].fase_id, solda.id);
        assert!(violacoes[0].motivo.contains("ordem repetida"));
    }

    #[test]
    fn test_validar_rota_fase_inexistente_e_ordem_invalida() {
        let (produtos, _fases) = setup();

        let rota = vec![RotaFase::new(999, 0, -1)];
        let violacoes = produtos.validar_rota(&rota).unwrap();
        // ordem não positiva, tempo negativo e fase inexistente
        assert_eq!(violacoes.len(), 3);
    }

    #[test]
    fn test_anexar_rota_invalida_rejeitada() {
        let (produtos, fases) = setup();
        let corte = fases.inserir("CORTE", "Corte", 30, false).unwrap();
        let produto = produtos.inserir("P-002", "Suporte").unwrap();

        let rota = vec![RotaFase::new(corte.id, -1, 30)];
        let err = produtos.anexar_rota(produto.id, &rota).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));
        assert!(produtos.rota_do_produto(produto.id).unwrap().is_empty());
    }

    #[test]
    fn test_anexar_rota_substitui_anterior() {
        let (produtos, fases) = setup();
        let corte = fases.inserir("CORTE", "Corte", 30, false).unwrap();
        let solda = fases.inserir("SOLDA", "Solda", 60, false).unwrap();
        let produto = produtos.inserir("P-003", "Caixa").unwrap();

        produtos
            .anexar_rota(produto.id, &[RotaFase::new(corte.id, 1, 30)])
            .unwrap();
        produtos
            .anexar_rota(
                produto.id,
                &[RotaFase::new(solda.id, 1, 60), RotaFase::new(corte.id, 2, 30)],
            )
            .unwrap();

        let rota = produtos.rota_do_produto(produto.id).unwrap();
        assert_eq!(rota.len(), 2);
        assert_eq!(rota[0].fase_id, solda.id);
    }
}
