// ==========================================
// Sistema MES - Motor de apontamentos
// ==========================================
// Máquina de estados: (nenhum) -> INICIADO -> FINALIZADO
// Transições:
// - iniciar: exige fase "próxima" do lote, fase livre e, sob
//   política OBRIGATORIA, máquina selecionada
// - responder_checklist: upsert, só com apontamento aberto
// - finalizar: exige checklist obrigatório completo; recalcula
//   a progressão e conclui o lote na última fase
//
// Concorrência: a abertura é um INSERT protegido pelo índice
// único parcial do repositório; dois iniciar() disputando a
// mesma fase resolvem de forma determinística (um vence, o
// outro recebe FaseOcupada).
// ==========================================

use crate::config::ConfigReader;
use crate::domain::types::{ApontamentoStatus, LoteStatus};
use crate::domain::{Apontamento, ChecklistResposta, ProgressaoLote};
use crate::engine::elegibilidade::ElegibilidadeMaquinas;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::progressao::ProgressaoEngine;
use crate::repository::error::RepositoryError;
use crate::repository::{
    ApontamentoRepository, FaseRepository, LoteRepository, MaquinaRepository,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Resultado da finalização: o registro fechado e a progressão
/// recalculada do lote (consistência leitura-após-escrita)
#[derive(Debug, Clone)]
pub struct ApontamentoFinalizado {
    pub apontamento: Apontamento,
    pub progressao: ProgressaoLote,
}

pub struct ApontamentoEngine {
    lote_repo: Arc<LoteRepository>,
    fase_repo: Arc<FaseRepository>,
    apontamento_repo: Arc<ApontamentoRepository>,
    elegibilidade: ElegibilidadeMaquinas,
    config: Arc<dyn ConfigReader>,
}

impl ApontamentoEngine {
    pub fn new(
        lote_repo: Arc<LoteRepository>,
        fase_repo: Arc<FaseRepository>,
        apontamento_repo: Arc<ApontamentoRepository>,
        maquina_repo: Arc<MaquinaRepository>,
        config: Arc<dyn ConfigReader>,
    ) -> Self {
        Self {
            lote_repo,
            fase_repo,
            apontamento_repo,
            elegibilidade: ElegibilidadeMaquinas::new(maquina_repo),
            config,
        }
    }

    /// Progressão atual do lote (consulta pura, sem efeito colateral)
    pub fn progressao_do_lote(&self, lote_id: i64) -> EngineResult<ProgressaoLote> {
        let lote = self
            .lote_repo
            .buscar(lote_id)?
            .ok_or(EngineError::NaoEncontrado {
                entidade: "Lote".to_string(),
                id: lote_id,
            })?;

        let fases = self.lote_repo.fases_do_lote(lote.id)?;
        if fases.is_empty() {
            return Err(EngineError::RotaVazia { lote_id: lote.id });
        }

        let apontamentos = self.apontamento_repo.listar_do_lote(lote.id)?;
        Ok(ProgressaoEngine::calcular(lote.id, &fases, &apontamentos))
    }

    /// Inicia um apontamento na fase indicada do lote
    ///
    /// Reemissão pelo mesmo operador é idempotente: devolve o
    /// apontamento já aberto em vez de falhar.
    #[instrument(skip(self), fields(lote_id, fase_id, operador_id))]
    pub async fn iniciar(
        &self,
        lote_id: i64,
        fase_id: i64,
        operador_id: i64,
        maquina_id: Option<i64>,
        observacoes: Option<&str>,
    ) -> EngineResult<Apontamento> {
        let lote = self
            .lote_repo
            .buscar(lote_id)?
            .ok_or(EngineError::NaoEncontrado {
                entidade: "Lote".to_string(),
                id: lote_id,
            })?;

        // lote pausado, cancelado ou concluído não recebe apontamento novo
        // (apontamentos já abertos ainda podem ser finalizados)
        match lote.status {
            LoteStatus::Pendente | LoteStatus::EmProducao => {}
            outro => {
                warn!(lote_id = lote.id, status = %outro, "iniciar recusado: lote indisponível");
                return Err(EngineError::LoteIndisponivel {
                    lote_id: lote.id,
                    status: outro.to_string(),
                });
            }
        }

        let fases = self.lote_repo.fases_do_lote(lote.id)?;
        if fases.is_empty() {
            return Err(EngineError::RotaVazia { lote_id: lote.id });
        }
        if !fases.iter().any(|f| f.fase_id == fase_id) {
            return Err(EngineError::NaoEncontrado {
                entidade: "Fase do lote".to_string(),
                id: fase_id,
            });
        }

        // idempotência / fase ocupada
        if let Some(aberto) = self.apontamento_repo.aberto_da_fase(lote.id, fase_id)? {
            if aberto.operador_id == operador_id {
                info!(apontamento_id = aberto.id, "apontamento já aberto pelo operador; devolvendo o existente");
                return Ok(aberto);
            }
            return Err(EngineError::FaseOcupada {
                lote_id: lote.id,
                fase_id,
                operador_id: aberto.operador_id,
            });
        }

        // um apontamento aberto por operador
        if let Some(outro) = self.apontamento_repo.aberto_do_operador(operador_id)? {
            return Err(EngineError::OperadorOcupado {
                operador_id,
                apontamento_id: outro.id,
            });
        }

        // progressão sequencial estrita: somente a fase "próxima"
        let apontamentos = self.apontamento_repo.listar_do_lote(lote.id)?;
        let progressao = ProgressaoEngine::calcular(lote.id, &fases, &apontamentos);
        let eh_proxima = progressao
            .fases
            .iter()
            .any(|f| f.fase_id == fase_id && f.proxima);
        if !eh_proxima {
            let fase_pendente = progressao
                .proxima_fase()
                .map(|f| f.fase_id)
                .unwrap_or(fase_id);
            return Err(EngineError::FaseForaDeOrdem {
                fase_id,
                fase_pendente,
            });
        }

        // política de máquina
        let politica = self.config.politica_maquina().await?;
        self.elegibilidade
            .validar_selecao(fase_id, maquina_id, politica)?;

        // inserção atômica: o índice único parcial decide corridas
        let apontamento = match self.apontamento_repo.inserir_iniciado(
            lote.id,
            lote.produto_id,
            fase_id,
            operador_id,
            maquina_id,
            observacoes,
        ) {
            Ok(a) => a,
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                // corrida perdida: outro operador abriu entre a leitura e o INSERT
                let vencedor = self
                    .apontamento_repo
                    .aberto_da_fase(lote.id, fase_id)?
                    .map(|a| a.operador_id)
                    .unwrap_or(0);
                warn!(lote_id = lote.id, fase_id, "corrida de iniciar perdida");
                return Err(EngineError::FaseOcupada {
                    lote_id: lote.id,
                    fase_id,
                    operador_id: vencedor,
                });
            }
            Err(e) => return Err(e.into()),
        };

        if lote.status == LoteStatus::Pendente {
            self.lote_repo
                .atualizar_status(lote.id, LoteStatus::EmProducao)?;
        }

        info!(
            apontamento_id = apontamento.id,
            lote_id = lote.id,
            fase_id,
            "apontamento iniciado"
        );
        Ok(apontamento)
    }

    /// Registra a resposta de um item do checklist do apontamento
    ///
    /// Permitido apenas com o apontamento aberto; o item precisa
    /// pertencer ao checklist da fase do apontamento.
    #[instrument(skip(self))]
    pub async fn responder_checklist(
        &self,
        apontamento_id: i64,
        item_id: i64,
        concluido: bool,
        observacao: Option<&str>,
    ) -> EngineResult<ChecklistResposta> {
        let apontamento = self
            .apontamento_repo
            .buscar(apontamento_id)?
            .ok_or(EngineError::NaoEncontrado {
                entidade: "Apontamento".to_string(),
                id: apontamento_id,
            })?;

        if apontamento.status != ApontamentoStatus::Iniciado {
            return Err(EngineError::EstadoInvalido {
                apontamento_id,
                status: apontamento.status.to_string(),
            });
        }

        let item = self
            .fase_repo
            .buscar_item_checklist(item_id)?
            .ok_or(EngineError::NaoEncontrado {
                entidade: "ChecklistItem".to_string(),
                id: item_id,
            })?;
        if item.fase_id != apontamento.fase_id {
            return Err(EngineError::ChecklistItemForaDaFase {
                item_id,
                fase_id: apontamento.fase_id,
            });
        }

        let resposta = self.apontamento_repo.responder_checklist(
            apontamento_id,
            item_id,
            concluido,
            observacao,
        )?;
        Ok(resposta)
    }

    /// Finaliza um apontamento aberto
    ///
    /// Bloqueado enquanto houver item obrigatório do checklist sem
    /// resposta concluída. Na última fase, o lote é concluído.
    #[instrument(skip(self, observacoes))]
    pub async fn finalizar(
        &self,
        apontamento_id: i64,
        observacoes: Option<&str>,
    ) -> EngineResult<ApontamentoFinalizado> {
        let apontamento = self
            .apontamento_repo
            .buscar(apontamento_id)?
            .ok_or(EngineError::NaoEncontrado {
                entidade: "Apontamento".to_string(),
                id: apontamento_id,
            })?;

        if apontamento.status != ApontamentoStatus::Iniciado {
            return Err(EngineError::EstadoInvalido {
                apontamento_id,
                status: apontamento.status.to_string(),
            });
        }

        // gate do checklist: itens obrigatórios precisam de resposta concluída
        let obrigatorios = self
            .fase_repo
            .itens_obrigatorios_da_fase(apontamento.fase_id)?;
        let respostas = self
            .apontamento_repo
            .respostas_do_apontamento(apontamento_id)?;
        let pendentes: Vec<String> = obrigatorios
            .iter()
            .filter(|item| {
                !respostas
                    .iter()
                    .any(|r| r.checklist_item_id == item.id && r.concluido)
            })
            .map(|item| item.descricao.clone())
            .collect();
        if !pendentes.is_empty() {
            return Err(EngineError::ChecklistIncompleto {
                apontamento_id,
                itens_pendentes: pendentes,
            });
        }

        // tempo real e atraso frente à estimativa do snapshot
        let data_fim = Utc::now().naive_utc();
        let tempo_real = (data_fim - apontamento.data_inicio).num_minutes().max(0);
        let estimado = self
            .lote_repo
            .fases_do_lote(apontamento.lote_id)?
            .iter()
            .find(|f| f.fase_id == apontamento.fase_id)
            .map(|f| f.tempo_estimado_minutos)
            .unwrap_or(0);
        let excedeu_tempo = estimado > 0 && tempo_real > estimado;
        let minutos_atraso = if excedeu_tempo { tempo_real - estimado } else { 0 };

        // UPDATE condicionado: uma segunda finalização concorrente perde aqui
        let afetados = self.apontamento_repo.finalizar(
            apontamento_id,
            data_fim,
            tempo_real,
            excedeu_tempo,
            minutos_atraso,
            observacoes,
        )?;
        if afetados == 0 {
            return Err(EngineError::EstadoInvalido {
                apontamento_id,
                status: ApontamentoStatus::Finalizado.to_string(),
            });
        }

        let fechado = self
            .apontamento_repo
            .buscar(apontamento_id)?
            .ok_or(EngineError::NaoEncontrado {
                entidade: "Apontamento".to_string(),
                id: apontamento_id,
            })?;

        // recalcula a progressão: a próxima fase passa a ser acionável
        let fases = self.lote_repo.fases_do_lote(apontamento.lote_id)?;
        let apontamentos = self.apontamento_repo.listar_do_lote(apontamento.lote_id)?;
        let progressao =
            ProgressaoEngine::calcular(apontamento.lote_id, &fases, &apontamentos);

        if progressao.concluida() {
            self.lote_repo
                .atualizar_status(apontamento.lote_id, LoteStatus::Concluido)?;
            info!(lote_id = apontamento.lote_id, "última fase finalizada; lote concluído");
        }

        info!(
            apontamento_id,
            tempo_real_minutos = tempo_real,
            excedeu_tempo,
            "apontamento finalizado"
        );
        Ok(ApontamentoFinalizado {
            apontamento: fechado,
            progressao,
        })
    }
}
