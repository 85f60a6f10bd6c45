// ==========================================
// Sistema MES - Importador de catálogo (CSV)
// ==========================================
// Carga inicial dos cadastros mestres a partir de arquivos CSV:
//   produtos.csv  codigo,descricao
//   fases.csv     codigo,nome,tempo_estimado_minutos,requer_aprovacao
//   checklist.csv fase_codigo,descricao,obrigatorio,ordem
//   maquinas.csv  codigo,nome,fase_codigo,ordem
//   rotas.csv     produto_codigo,fase_codigo,ordem,tempo_estimado_minutos,tempo_prateleira_horas
//
// A importação é linha a linha: linha ruim vira rejeição no resumo
// e não derruba o restante do arquivo. A ordem dos arquivos importa
// (fases antes de checklist/máquinas/rotas).
// ==========================================

use crate::domain::RotaFase;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{
    FaseRepository, LoteRepository, MaquinaRepository, ProdutoRepository,
};
use csv::ReaderBuilder;
use rusqlite::Connection;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// ==========================================
// Resumo
// ==========================================

/// Linha rejeitada e o motivo
#[derive(Debug, Clone)]
pub struct RejeicaoLinha {
    pub linha: usize,
    pub motivo: String,
}

/// Resultado da importação de um arquivo
#[derive(Debug, Clone)]
pub struct ResumoImportacao {
    pub arquivo: String,
    pub importados: usize,
    pub rejeitados: Vec<RejeicaoLinha>,
}

impl ResumoImportacao {
    fn novo(arquivo: &str) -> Self {
        Self {
            arquivo: arquivo.to_string(),
            importados: 0,
            rejeitados: Vec::new(),
        }
    }

    fn rejeitar(&mut self, linha: usize, motivo: String) {
        warn!(arquivo = %self.arquivo, linha, motivo = %motivo, "linha rejeitada");
        self.rejeitados.push(RejeicaoLinha { linha, motivo });
    }
}

// ==========================================
// Linhas dos arquivos
// ==========================================

#[derive(Debug, Deserialize)]
struct LinhaProduto {
    codigo: String,
    descricao: String,
}

#[derive(Debug, Deserialize)]
struct LinhaFase {
    codigo: String,
    nome: String,
    tempo_estimado_minutos: i64,
    requer_aprovacao: String,
}

#[derive(Debug, Deserialize)]
struct LinhaChecklist {
    fase_codigo: String,
    descricao: String,
    obrigatorio: String,
    ordem: i64,
}

#[derive(Debug, Deserialize)]
struct LinhaMaquina {
    codigo: String,
    nome: String,
    fase_codigo: String,
    ordem: i64,
}

#[derive(Debug, Deserialize)]
struct LinhaRota {
    produto_codigo: String,
    fase_codigo: String,
    ordem: i64,
    tempo_estimado_minutos: i64,
    tempo_prateleira_horas: Option<i64>,
}

/// Aceita as grafias usuais das planilhas da fábrica
fn parse_bool(valor: &str) -> Option<bool> {
    match valor.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "sim" | "s" => Some(true),
        "0" | "false" | "nao" | "não" | "n" | "" => Some(false),
        _ => None,
    }
}

// ==========================================
// Importador
// ==========================================

pub struct CatalogoImporter {
    fase_repo: Arc<FaseRepository>,
    produto_repo: Arc<ProdutoRepository>,
    maquina_repo: Arc<MaquinaRepository>,
}

impl CatalogoImporter {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        // LoteRepository só para garantir o schema completo no init
        let _ = LoteRepository::from_connection(conn.clone())?;
        Ok(Self {
            fase_repo: Arc::new(FaseRepository::from_connection(conn.clone())?),
            produto_repo: Arc::new(ProdutoRepository::from_connection(conn.clone())?),
            maquina_repo: Arc::new(MaquinaRepository::from_connection(conn)?),
        })
    }

    fn abrir_csv(caminho: &Path) -> ImportResult<csv::Reader<File>> {
        if !caminho.exists() {
            return Err(ImportError::ArquivoNaoEncontrado(
                caminho.display().to_string(),
            ));
        }
        if caminho.extension().map_or(true, |ext| ext != "csv") {
            return Err(ImportError::FormatoNaoSuportado(
                caminho.display().to_string(),
            ));
        }
        let file = File::open(caminho)?;
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file))
    }

    // ==========================================
    // Arquivos individuais
    // ==========================================

    pub fn importar_produtos(&self, caminho: &Path) -> ImportResult<ResumoImportacao> {
        let mut reader = Self::abrir_csv(caminho)?;
        let mut resumo = ResumoImportacao::novo("produtos.csv");

        for (idx, registro) in reader.deserialize::<LinhaProduto>().enumerate() {
            let linha = idx + 2; // 1 = cabeçalho
            let row = match registro {
                Ok(r) => r,
                Err(e) => {
                    resumo.rejeitar(linha, e.to_string());
                    continue;
                }
            };
            match self.produto_repo.inserir(&row.codigo, &row.descricao) {
                Ok(_) => resumo.importados += 1,
                Err(e) => resumo.rejeitar(linha, e.to_string()),
            }
        }
        Ok(resumo)
    }

    pub fn importar_fases(&self, caminho: &Path) -> ImportResult<ResumoImportacao> {
        let mut reader = Self::abrir_csv(caminho)?;
        let mut resumo = ResumoImportacao::novo("fases.csv");

        for (idx, registro) in reader.deserialize::<LinhaFase>().enumerate() {
            let linha = idx + 2;
            let row = match registro {
                Ok(r) => r,
                Err(e) => {
                    resumo.rejeitar(linha, e.to_string());
                    continue;
                }
            };
            let requer_aprovacao = match parse_bool(&row.requer_aprovacao) {
                Some(v) => v,
                None => {
                    resumo.rejeitar(
                        linha,
                        format!("requer_aprovacao inválido: {}", row.requer_aprovacao),
                    );
                    continue;
                }
            };
            match self.fase_repo.inserir(
                &row.codigo,
                &row.nome,
                row.tempo_estimado_minutos,
                requer_aprovacao,
            ) {
                Ok(_) => resumo.importados += 1,
                Err(e) => resumo.rejeitar(linha, e.to_string()),
            }
        }
        Ok(resumo)
    }

    pub fn importar_checklist(&self, caminho: &Path) -> ImportResult<ResumoImportacao> {
        let mut reader = Self::abrir_csv(caminho)?;
        let mut resumo = ResumoImportacao::novo("checklist.csv");

        for (idx, registro) in reader.deserialize::<LinhaChecklist>().enumerate() {
            let linha = idx + 2;
            let row = match registro {
                Ok(r) => r,
                Err(e) => {
                    resumo.rejeitar(linha, e.to_string());
                    continue;
                }
            };
            let fase = match self.fase_repo.buscar_por_codigo(&row.fase_codigo)? {
                Some(f) => f,
                None => {
                    resumo.rejeitar(linha, format!("fase inexistente: {}", row.fase_codigo));
                    continue;
                }
            };
            let obrigatorio = match parse_bool(&row.obrigatorio) {
                Some(v) => v,
                None => {
                    resumo.rejeitar(linha, format!("obrigatorio inválido: {}", row.obrigatorio));
                    continue;
                }
            };
            match self.fase_repo.inserir_item_checklist(
                fase.id,
                &row.descricao,
                obrigatorio,
                row.ordem,
            ) {
                Ok(_) => resumo.importados += 1,
                Err(e) => resumo.rejeitar(linha, e.to_string()),
            }
        }
        Ok(resumo)
    }

    pub fn importar_maquinas(&self, caminho: &Path) -> ImportResult<ResumoImportacao> {
        let mut reader = Self::abrir_csv(caminho)?;
        let mut resumo = ResumoImportacao::novo("maquinas.csv");

        for (idx, registro) in reader.deserialize::<LinhaMaquina>().enumerate() {
            let linha = idx + 2;
            let row = match registro {
                Ok(r) => r,
                Err(e) => {
                    resumo.rejeitar(linha, e.to_string());
                    continue;
                }
            };
            let fase = match self.fase_repo.buscar_por_codigo(&row.fase_codigo)? {
                Some(f) => f,
                None => {
                    resumo.rejeitar(linha, format!("fase inexistente: {}", row.fase_codigo));
                    continue;
                }
            };
            match self
                .maquina_repo
                .inserir(&row.codigo, &row.nome, fase.id, row.ordem)
            {
                Ok(_) => resumo.importados += 1,
                Err(e) => resumo.rejeitar(linha, e.to_string()),
            }
        }
        Ok(resumo)
    }

    /// Rotas são agrupadas por produto e gravadas por inteiro; uma
    /// linha ruim rejeita a rota do produto inteiro (evita gravar
    /// rota pela metade).
    pub fn importar_rotas(&self, caminho: &Path) -> ImportResult<ResumoImportacao> {
        let mut reader = Self::abrir_csv(caminho)?;
        let mut resumo = ResumoImportacao::novo("rotas.csv");

        // produto_codigo -> (primeira linha do grupo, entradas, erro?)
        let mut grupos: BTreeMap<String, (usize, Vec<RotaFase>, Option<String>)> = BTreeMap::new();

        for (idx, registro) in reader.deserialize::<LinhaRota>().enumerate() {
            let linha = idx + 2;
            let row = match registro {
                Ok(r) => r,
                Err(e) => {
                    resumo.rejeitar(linha, e.to_string());
                    continue;
                }
            };

            let grupo = grupos
                .entry(row.produto_codigo.clone())
                .or_insert_with(|| (linha, Vec::new(), None));
            if grupo.2.is_some() {
                continue;
            }

            match self.fase_repo.buscar_por_codigo(&row.fase_codigo)? {
                Some(fase) => {
                    let mut entrada =
                        RotaFase::new(fase.id, row.ordem, row.tempo_estimado_minutos);
                    entrada.tempo_prateleira_horas = row.tempo_prateleira_horas;
                    grupo.1.push(entrada);
                }
                None => {
                    grupo.2 = Some(format!(
                        "linha {}: fase inexistente: {}",
                        linha, row.fase_codigo
                    ));
                }
            }
        }

        for (produto_codigo, (linha, entradas, erro)) in grupos {
            if let Some(motivo) = erro {
                resumo.rejeitar(linha, format!("rota de {}: {}", produto_codigo, motivo));
                continue;
            }
            let produto = match self.produto_repo.buscar_por_codigo(&produto_codigo)? {
                Some(p) => p,
                None => {
                    resumo.rejeitar(linha, format!("produto inexistente: {}", produto_codigo));
                    continue;
                }
            };
            match self.produto_repo.anexar_rota(produto.id, &entradas) {
                Ok(()) => resumo.importados += entradas.len(),
                Err(e) => {
                    resumo.rejeitar(linha, format!("rota de {}: {}", produto_codigo, e))
                }
            }
        }

        Ok(resumo)
    }

    // ==========================================
    // Diretório completo
    // ==========================================

    /// Importa os arquivos presentes no diretório, na ordem de
    /// dependência. Arquivo ausente é ignorado.
    pub fn importar_diretorio(&self, dir: &Path) -> ImportResult<Vec<ResumoImportacao>> {
        let mut resumos = Vec::new();
        let passos: [(&str, fn(&Self, &Path) -> ImportResult<ResumoImportacao>); 5] = [
            ("produtos.csv", Self::importar_produtos),
            ("fases.csv", Self::importar_fases),
            ("checklist.csv", Self::importar_checklist),
            ("maquinas.csv", Self::importar_maquinas),
            ("rotas.csv", Self::importar_rotas),
        ];

        for (nome, passo) in passos {
            let caminho = dir.join(nome);
            if !caminho.exists() {
                continue;
            }
            let resumo = passo(self, &caminho)?;
            info!(
                arquivo = nome,
                importados = resumo.importados,
                rejeitados = resumo.rejeitados.len(),
                "arquivo importado"
            );
            resumos.push(resumo);
        }
        Ok(resumos)
    }
}
