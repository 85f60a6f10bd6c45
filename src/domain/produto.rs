// ==========================================
// Sistema MES - Produto e rota de produção
// ==========================================
// RotaFase: entrada da rota (fase + ordem + estimativa)
// A rota é validada antes de ser anexada ao produto e
// copiada (snapshot) para cada lote no momento da criação
// ==========================================

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Produto {
    pub id: i64,
    pub codigo: String,
    pub descricao: String,
    pub ativo: bool,
}

// ==========================================
// RotaFase - entrada da rota do produto
// ==========================================
// Regras de validação (aplicadas ao anexar a rota):
// - ordem: inteiros positivos, únicos por produto
// - fase_id: deve referenciar fase ativa do catálogo
// - tempo_estimado_minutos >= 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotaFase {
    pub fase_id: i64,
    pub ordem: i64,
    pub tempo_estimado_minutos: i64,
    pub tempo_prateleira_horas: Option<i64>, // validade entre fases (informativo)
}

impl RotaFase {
    pub fn new(fase_id: i64, ordem: i64, tempo_estimado_minutos: i64) -> Self {
        Self {
            fase_id,
            ordem,
            tempo_estimado_minutos,
            tempo_prateleira_horas: None,
        }
    }
}
