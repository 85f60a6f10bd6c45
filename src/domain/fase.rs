// ==========================================
// Sistema MES - Fase de produção e checklist
// ==========================================
// Fase: etapa do catálogo, reutilizada por várias rotas de produto
// ChecklistItem: modelo de item de verificação vinculado à fase
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Fase - etapa do catálogo
// ==========================================
// Imutável enquanto referenciada por lote em andamento
// (alterações valem para lotes futuros, via novo snapshot)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fase {
    pub id: i64,
    pub codigo: String,                // código curto (ex: "CORTE")
    pub nome: String,                  // nome exibido
    pub tempo_estimado_minutos: i64,   // estimativa padrão da fase
    pub requer_aprovacao: bool,        // fase exige aprovação da qualidade
    pub ativo: bool,
}

// ==========================================
// ChecklistItem - item do checklist da fase
// ==========================================
// Itens com obrigatorio=true bloqueiam a finalização do apontamento
// enquanto não houver resposta concluído=true
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: i64,
    pub fase_id: i64,
    pub descricao: String,
    pub obrigatorio: bool,
    pub ordem: i64,
    pub ativo: bool,
}
