// ==========================================
// Sistema MES - Lote e progressão de fases
// ==========================================
// FaseLote: snapshot de uma entrada da rota, tirado na criação do lote.
// Alterações posteriores na rota do produto não reordenam lotes em andamento.
// ProgressaoLote: visão derivada dos apontamentos, nunca armazenada.
// ==========================================

use crate::domain::types::{FaseProgressoStatus, LoteStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Lote - ordem de produção
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lote {
    pub id: i64,
    pub codigo: String,
    pub produto_id: i64,
    pub quantidade: i64,
    pub status: LoteStatus,
    pub prioridade: bool,
    pub data_criacao: NaiveDateTime,
    pub observacoes: Option<String>,
    pub ativo: bool,
}

// ==========================================
// FaseLote - fase do lote (snapshot da rota)
// ==========================================
// snapshot_id agrupa as entradas copiadas no mesmo ato de criação
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaseLote {
    pub id: i64,
    pub lote_id: i64,
    pub fase_id: i64,
    pub snapshot_id: String,
    pub ordem: i64,
    pub tempo_estimado_minutos: i64,
    pub tempo_prateleira_horas: Option<i64>,
}

// ==========================================
// FaseProgresso - status calculado de uma fase do lote
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaseProgresso {
    pub fase_id: i64,
    pub ordem: i64,
    pub status: FaseProgressoStatus,
    /// Verdadeiro apenas para a primeira fase não concluída cujas
    /// antecessoras estão todas concluídas
    pub proxima: bool,
    /// Operador que mantém o apontamento aberto, se houver
    pub operador_em_andamento: Option<i64>,
}

// ==========================================
// ProgressaoLote - visão completa da progressão
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressaoLote {
    pub lote_id: i64,
    pub fases: Vec<FaseProgresso>,
    pub total_fases: usize,
    pub fases_concluidas: usize,
    /// Fração concluída em precisão completa (0.0 a 1.0);
    /// o arredondamento acontece somente na exibição
    pub progresso: f64,
}

impl ProgressaoLote {
    /// Percentual para exibição, arredondado ao inteiro mais próximo
    pub fn progresso_pct(&self) -> i64 {
        (self.progresso * 100.0).round() as i64
    }

    /// Fase marcada como próxima, se houver
    pub fn proxima_fase(&self) -> Option<&FaseProgresso> {
        self.fases.iter().find(|f| f.proxima)
    }

    /// Verdadeiro quando todas as fases estão concluídas (e existe ao menos uma)
    pub fn concluida(&self) -> bool {
        self.total_fases > 0 && self.fases_concluidas == self.total_fases
    }
}
