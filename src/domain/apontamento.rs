// ==========================================
// Sistema MES - Apontamento de produção
// ==========================================
// Registro cronometrado do trabalho de um operador em
// uma fase de um lote. No máximo um apontamento INICIADO
// por (lote, fase) em qualquer instante.
// ==========================================

use crate::domain::types::ApontamentoStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apontamento {
    pub id: i64,
    pub lote_id: i64,
    pub produto_id: i64,
    pub fase_id: i64,
    pub operador_id: i64,
    pub maquina_id: Option<i64>,
    pub status: ApontamentoStatus,
    pub data_inicio: NaiveDateTime,
    pub data_fim: Option<NaiveDateTime>,
    /// Duração real em minutos, calculada na finalização
    pub tempo_real_minutos: Option<i64>,
    /// Verdadeiro quando tempo_real excedeu a estimativa da fase do lote
    pub excedeu_tempo: bool,
    pub minutos_atraso: i64,
    pub observacoes: Option<String>,
}

impl Apontamento {
    pub fn esta_aberto(&self) -> bool {
        self.status == ApontamentoStatus::Iniciado
    }

    pub fn esta_finalizado(&self) -> bool {
        self.status == ApontamentoStatus::Finalizado
    }
}

// ==========================================
// ChecklistResposta - resposta a um item do checklist
// ==========================================
// Uma resposta por (apontamento, item); última escrita vence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistResposta {
    pub id: i64,
    pub apontamento_id: i64,
    pub checklist_item_id: i64,
    pub concluido: bool,
    pub observacao: Option<String>,
    pub data_resposta: NaiveDateTime,
}
