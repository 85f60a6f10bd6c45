// ==========================================
// Sistema MES - API de produção (chão de fábrica)
// ==========================================
// Fachada usada pelos terminais de apontamento: progressão do
// lote, abertura e fechamento de apontamentos, checklist e
// leitura de QR code. Toda escrita passa pelo motor; a fachada
// só monta as visões e traduz erros.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ConfigReader};
use crate::domain::types::FaseProgressoStatus;
use crate::domain::{Apontamento, ChecklistItem, ChecklistResposta, Lote, Maquina};
use crate::engine::{ApontamentoEngine, ApontamentoFinalizado, QrPayload};
use crate::repository::{
    ApontamentoRepository, FaseRepository, LoteRepository, MaquinaRepository,
};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::info;

// ==========================================
// Visões de progressão
// ==========================================

/// Linha da progressão com os dados da fase já resolvidos
#[derive(Debug, Clone, Serialize)]
pub struct FaseProgressoDetalhe {
    pub fase_id: i64,
    pub codigo: String,
    pub nome: String,
    pub ordem: i64,
    pub tempo_estimado_minutos: i64,
    pub status: FaseProgressoStatus,
    pub proxima: bool,
    pub operador_em_andamento: Option<i64>,
}

/// Progressão do lote pronta para exibição
#[derive(Debug, Clone, Serialize)]
pub struct ProgressaoDetalhada {
    pub lote: Lote,
    pub fases: Vec<FaseProgressoDetalhe>,
    pub total_fases: usize,
    pub fases_concluidas: usize,
    pub progresso_pct: i64,
}

/// Item do checklist pareado com a resposta já registrada (se houver)
#[derive(Debug, Clone, Serialize)]
pub struct ItemComResposta {
    pub item: ChecklistItem,
    pub resposta: Option<ChecklistResposta>,
}

// ==========================================
// Fachada
// ==========================================

pub struct ProducaoApi {
    lote_repo: Arc<LoteRepository>,
    fase_repo: Arc<FaseRepository>,
    apontamento_repo: Arc<ApontamentoRepository>,
    maquina_repo: Arc<MaquinaRepository>,
    engine: ApontamentoEngine,
}

impl ProducaoApi {
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_shared_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let lote_repo = Arc::new(LoteRepository::from_connection(conn.clone())?);
        let fase_repo = Arc::new(FaseRepository::from_connection(conn.clone())?);
        let apontamento_repo = Arc::new(ApontamentoRepository::from_connection(conn.clone())?);
        let maquina_repo = Arc::new(MaquinaRepository::from_connection(conn.clone())?);
        let config: Arc<dyn ConfigReader> = Arc::new(ConfigManager::from_connection(conn)?);

        let engine = ApontamentoEngine::new(
            lote_repo.clone(),
            fase_repo.clone(),
            apontamento_repo.clone(),
            maquina_repo.clone(),
            config,
        );

        Ok(Self {
            lote_repo,
            fase_repo,
            apontamento_repo,
            maquina_repo,
            engine,
        })
    }

    // ==========================================
    // Consultas
    // ==========================================

    /// Lotes liberados para o chão de fábrica, prioritários primeiro
    pub fn listar_lotes_disponiveis(&self) -> ApiResult<Vec<Lote>> {
        Ok(self.lote_repo.listar_disponiveis()?)
    }

    /// Progressão do lote com os dados de catálogo resolvidos para exibição
    pub fn obter_progressao(&self, lote_id: i64) -> ApiResult<ProgressaoDetalhada> {
        let lote = self
            .lote_repo
            .buscar(lote_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Lote com id={}", lote_id)))?;

        let progressao = self.engine.progressao_do_lote(lote_id)?;
        let snapshot = self.lote_repo.fases_do_lote(lote_id)?;

        let mut fases = Vec::with_capacity(progressao.fases.len());
        for fp in &progressao.fases {
            let fase = self
                .fase_repo
                .buscar(fp.fase_id)?
                .ok_or_else(|| ApiError::NaoEncontrado(format!("Fase com id={}", fp.fase_id)))?;
            let tempo = snapshot
                .iter()
                .find(|fl| fl.fase_id == fp.fase_id)
                .map(|fl| fl.tempo_estimado_minutos)
                .unwrap_or(fase.tempo_estimado_minutos);
            fases.push(FaseProgressoDetalhe {
                fase_id: fp.fase_id,
                codigo: fase.codigo,
                nome: fase.nome,
                ordem: fp.ordem,
                tempo_estimado_minutos: tempo,
                status: fp.status,
                proxima: fp.proxima,
                operador_em_andamento: fp.operador_em_andamento,
            });
        }

        Ok(ProgressaoDetalhada {
            lote,
            fases,
            total_fases: progressao.total_fases,
            fases_concluidas: progressao.fases_concluidas,
            progresso_pct: progressao.progresso_pct(),
        })
    }

    /// Máquinas ativas elegíveis para a fase, na ordem de exibição
    ///
    /// Fase inexistente é erro; fase sem máquinas devolve lista vazia.
    pub fn listar_maquinas_da_fase(&self, fase_id: i64) -> ApiResult<Vec<Maquina>> {
        self.fase_repo
            .buscar(fase_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Fase com id={}", fase_id)))?;
        let maquinas = self
            .maquina_repo
            .listar_da_fase(fase_id)?
            .into_iter()
            .filter(|m| m.esta_ativa())
            .collect();
        Ok(maquinas)
    }

    /// Itens do checklist da fase do apontamento, com as respostas já dadas
    pub fn checklist_do_apontamento(&self, apontamento_id: i64) -> ApiResult<Vec<ItemComResposta>> {
        let apontamento = self
            .apontamento_repo
            .buscar(apontamento_id)?
            .ok_or_else(|| {
                ApiError::NaoEncontrado(format!("Apontamento com id={}", apontamento_id))
            })?;

        let itens = self.fase_repo.itens_checklist_da_fase(apontamento.fase_id)?;
        let respostas = self.apontamento_repo.respostas_do_apontamento(apontamento_id)?;

        Ok(itens
            .into_iter()
            .map(|item| {
                let resposta = respostas
                    .iter()
                    .find(|r| r.checklist_item_id == item.id)
                    .cloned();
                ItemComResposta { item, resposta }
            })
            .collect())
    }

    /// Últimos apontamentos do operador, mais recentes primeiro
    pub fn historico_operador(
        &self,
        operador_id: i64,
        limite: usize,
    ) -> ApiResult<Vec<Apontamento>> {
        Ok(self
            .apontamento_repo
            .historico_do_operador(operador_id, limite)?)
    }

    // ==========================================
    // QR code
    // ==========================================

    /// Resolve o QR de uma máquina para o registro do catálogo
    pub fn resolver_maquina_qr(&self, texto: &str) -> ApiResult<Maquina> {
        match QrPayload::parse(texto).map_err(|e| ApiError::EntradaInvalida(e.to_string()))? {
            QrPayload::Maquina { codigo } => self
                .maquina_repo
                .buscar_por_codigo(&codigo)?
                .ok_or_else(|| {
                    ApiError::NaoEncontrado(format!("Maquina com código {}", codigo))
                }),
            QrPayload::Lote { .. } => Err(ApiError::EntradaInvalida(
                "QR informado é de lote, esperava máquina".to_string(),
            )),
        }
    }

    /// Abre um apontamento a partir do QR impresso na ordem de produção
    pub async fn iniciar_por_qr(
        &self,
        texto: &str,
        operador_id: i64,
        maquina_id: Option<i64>,
        observacoes: Option<&str>,
    ) -> ApiResult<Apontamento> {
        match QrPayload::parse(texto).map_err(|e| ApiError::EntradaInvalida(e.to_string()))? {
            QrPayload::Lote {
                lote_id, fase_id, ..
            } => {
                self.iniciar_apontamento(lote_id, fase_id, operador_id, maquina_id, observacoes)
                    .await
            }
            QrPayload::Maquina { .. } => Err(ApiError::EntradaInvalida(
                "QR informado é de máquina, esperava lote".to_string(),
            )),
        }
    }

    // ==========================================
    // Transições
    // ==========================================

    pub async fn iniciar_apontamento(
        &self,
        lote_id: i64,
        fase_id: i64,
        operador_id: i64,
        maquina_id: Option<i64>,
        observacoes: Option<&str>,
    ) -> ApiResult<Apontamento> {
        let apontamento = self
            .engine
            .iniciar(lote_id, fase_id, operador_id, maquina_id, observacoes)
            .await?;
        info!(
            apontamento_id = apontamento.id,
            lote_id, fase_id, operador_id, "apontamento aberto"
        );
        Ok(apontamento)
    }

    pub async fn responder_checklist(
        &self,
        apontamento_id: i64,
        item_id: i64,
        concluido: bool,
        observacao: Option<&str>,
    ) -> ApiResult<ChecklistResposta> {
        Ok(self
            .engine
            .responder_checklist(apontamento_id, item_id, concluido, observacao)
            .await?)
    }

    pub async fn finalizar_apontamento(
        &self,
        apontamento_id: i64,
        observacoes: Option<&str>,
    ) -> ApiResult<ApontamentoFinalizado> {
        let finalizado = self.engine.finalizar(apontamento_id, observacoes).await?;
        info!(
            apontamento_id,
            lote_id = finalizado.apontamento.lote_id,
            progresso_pct = finalizado.progressao.progresso_pct(),
            "apontamento finalizado"
        );
        Ok(finalizado)
    }
}
