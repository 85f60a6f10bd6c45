// ==========================================
// Sistema MES - API de catálogo (engenharia/PCP)
// ==========================================
// Cadastros mestres: fases, checklists, produtos e rotas,
// máquinas e criação de lotes. A rota do produto é copiada para
// o lote no momento da criação; edições posteriores da rota não
// alcançam lotes já abertos.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, CHAVE_POLITICA_MAQUINA};
use crate::domain::types::{LoteStatus, MaquinaStatus, PoliticaMaquina};
use crate::domain::{ChecklistItem, Fase, Lote, Maquina, Produto, RotaFase};
use crate::repository::{
    FaseRepository, LoteRepository, MaquinaRepository, ProdutoRepository,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct CatalogoApi {
    fase_repo: Arc<FaseRepository>,
    produto_repo: Arc<ProdutoRepository>,
    maquina_repo: Arc<MaquinaRepository>,
    lote_repo: Arc<LoteRepository>,
    config: Arc<ConfigManager>,
}

impl CatalogoApi {
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_shared_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        Ok(Self {
            fase_repo: Arc::new(FaseRepository::from_connection(conn.clone())?),
            produto_repo: Arc::new(ProdutoRepository::from_connection(conn.clone())?),
            maquina_repo: Arc::new(MaquinaRepository::from_connection(conn.clone())?),
            lote_repo: Arc::new(LoteRepository::from_connection(conn.clone())?),
            config: Arc::new(ConfigManager::from_connection(conn)?),
        })
    }

    // ==========================================
    // Fases e checklist
    // ==========================================

    pub fn criar_fase(
        &self,
        codigo: &str,
        nome: &str,
        tempo_estimado_minutos: i64,
        requer_aprovacao: bool,
    ) -> ApiResult<Fase> {
        let fase = self
            .fase_repo
            .inserir(codigo, nome, tempo_estimado_minutos, requer_aprovacao)?;
        info!(fase_id = fase.id, codigo, "fase cadastrada");
        Ok(fase)
    }

    pub fn listar_fases(&self) -> ApiResult<Vec<Fase>> {
        Ok(self.fase_repo.listar_ativas()?)
    }

    /// Desativa a fase no catálogo; rotas e lotes existentes não mudam
    pub fn desativar_fase(&self, fase_id: i64) -> ApiResult<()> {
        Ok(self.fase_repo.desativar(fase_id)?)
    }

    pub fn adicionar_item_checklist(
        &self,
        fase_id: i64,
        descricao: &str,
        obrigatorio: bool,
        ordem: i64,
    ) -> ApiResult<ChecklistItem> {
        self.fase_repo
            .buscar(fase_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Fase com id={}", fase_id)))?;
        Ok(self
            .fase_repo
            .inserir_item_checklist(fase_id, descricao, obrigatorio, ordem)?)
    }

    pub fn checklist_da_fase(&self, fase_id: i64) -> ApiResult<Vec<ChecklistItem>> {
        Ok(self.fase_repo.itens_checklist_da_fase(fase_id)?)
    }

    // ==========================================
    // Produtos e rotas
    // ==========================================

    pub fn criar_produto(&self, codigo: &str, descricao: &str) -> ApiResult<Produto> {
        let produto = self.produto_repo.inserir(codigo, descricao)?;
        info!(produto_id = produto.id, codigo, "produto cadastrado");
        Ok(produto)
    }

    pub fn listar_produtos(&self) -> ApiResult<Vec<Produto>> {
        Ok(self.produto_repo.listar_ativos()?)
    }

    /// Valida a rota; devolve as violações sem gravar nada
    pub fn validar_rota(&self, entradas: &[RotaFase]) -> ApiResult<Vec<crate::repository::RotaInvalidaDetalhe>> {
        Ok(self.produto_repo.validar_rota(entradas)?)
    }

    /// Grava a rota do produto, substituindo a anterior
    ///
    /// Rota vazia é aceita aqui (produto sem rota existe no catálogo);
    /// a restrição vale na criação do lote.
    pub fn definir_rota(&self, produto_id: i64, entradas: &[RotaFase]) -> ApiResult<()> {
        self.produto_repo
            .buscar(produto_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Produto com id={}", produto_id)))?;

        let violacoes = self.produto_repo.validar_rota(entradas)?;
        if !violacoes.is_empty() {
            return Err(ApiError::RotaInvalida { violacoes });
        }

        self.produto_repo.anexar_rota(produto_id, entradas)?;
        info!(produto_id, fases = entradas.len(), "rota do produto gravada");
        Ok(())
    }

    pub fn rota_do_produto(&self, produto_id: i64) -> ApiResult<Vec<RotaFase>> {
        Ok(self.produto_repo.rota_do_produto(produto_id)?)
    }

    // ==========================================
    // Máquinas
    // ==========================================

    pub fn criar_maquina(
        &self,
        codigo: &str,
        nome: &str,
        fase_id: i64,
        ordem: i64,
    ) -> ApiResult<Maquina> {
        self.fase_repo
            .buscar(fase_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Fase com id={}", fase_id)))?;
        Ok(self.maquina_repo.inserir(codigo, nome, fase_id, ordem)?)
    }

    pub fn listar_maquinas_da_fase(&self, fase_id: i64) -> ApiResult<Vec<Maquina>> {
        self.fase_repo
            .buscar(fase_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Fase com id={}", fase_id)))?;
        Ok(self.maquina_repo.listar_da_fase(fase_id)?)
    }

    pub fn atualizar_status_maquina(
        &self,
        maquina_id: i64,
        status: MaquinaStatus,
    ) -> ApiResult<()> {
        Ok(self.maquina_repo.atualizar_status(maquina_id, status)?)
    }

    /// Reordena as máquinas de uma fase conforme a lista de ids
    pub fn reordenar_maquinas(&self, fase_id: i64, ids_em_ordem: &[i64]) -> ApiResult<()> {
        Ok(self.maquina_repo.reordenar_fase(fase_id, ids_em_ordem)?)
    }

    // ==========================================
    // Lotes
    // ==========================================

    /// Cria um lote copiando a rota vigente do produto
    pub fn criar_lote(
        &self,
        codigo: &str,
        produto_id: i64,
        quantidade: i64,
        prioridade: bool,
    ) -> ApiResult<Lote> {
        let produto = self
            .produto_repo
            .buscar(produto_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Produto com id={}", produto_id)))?;

        let rota = self.produto_repo.rota_do_produto(produto.id)?;
        if rota.is_empty() {
            return Err(ApiError::RotaVazia {
                produto_id: produto.id,
            });
        }

        let lote = self
            .lote_repo
            .criar(codigo, produto.id, quantidade, prioridade, &rota)?;
        info!(
            lote_id = lote.id,
            codigo,
            produto_id,
            fases = rota.len(),
            "lote criado com snapshot de rota"
        );
        Ok(lote)
    }

    pub fn buscar_lote_por_codigo(&self, codigo: &str) -> ApiResult<Option<Lote>> {
        Ok(self.lote_repo.buscar_por_codigo(codigo)?)
    }

    /// Pausa um lote em produção: apontamentos abertos podem ser
    /// finalizados, mas nenhum novo é aceito até a retomada
    pub fn pausar_lote(&self, lote_id: i64) -> ApiResult<()> {
        let lote = self
            .lote_repo
            .buscar(lote_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Lote com id={}", lote_id)))?;
        if lote.status != LoteStatus::EmProducao {
            return Err(ApiError::EstadoInvalido(format!(
                "lote {} está {} e não pode ser pausado",
                lote_id, lote.status
            )));
        }
        self.lote_repo.atualizar_status(lote_id, LoteStatus::EmPausa)?;
        info!(lote_id, "lote pausado");
        Ok(())
    }

    /// Retoma um lote pausado para EM_PRODUCAO
    pub fn retomar_lote(&self, lote_id: i64) -> ApiResult<()> {
        let lote = self
            .lote_repo
            .buscar(lote_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Lote com id={}", lote_id)))?;
        if lote.status != LoteStatus::EmPausa {
            return Err(ApiError::EstadoInvalido(format!(
                "lote {} está {} e não pode ser retomado",
                lote_id, lote.status
            )));
        }
        self.lote_repo.atualizar_status(lote_id, LoteStatus::EmProducao)?;
        info!(lote_id, "lote retomado");
        Ok(())
    }

    /// Marca o lote como cancelado; apontamentos já fechados permanecem
    pub fn cancelar_lote(&self, lote_id: i64) -> ApiResult<()> {
        self.lote_repo
            .buscar(lote_id)?
            .ok_or_else(|| ApiError::NaoEncontrado(format!("Lote com id={}", lote_id)))?;
        Ok(self.lote_repo.atualizar_status(lote_id, LoteStatus::Cancelado)?)
    }

    // ==========================================
    // Configuração
    // ==========================================

    /// Define a política global de seleção de máquina
    pub fn definir_politica_maquina(&self, politica: PoliticaMaquina) -> ApiResult<()> {
        self.config
            .definir(CHAVE_POLITICA_MAQUINA, &politica.to_string())?;
        info!(politica = %politica, "política de máquina atualizada");
        Ok(())
    }
}
