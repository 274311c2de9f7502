pub mod user_repo;
pub use user_repo::UserRepository;
pub mod ferramenta_repo;
pub use ferramenta_repo::{FerramentaRepository, PgFerramentaRepository};
pub mod movimentacao_repo;
pub use movimentacao_repo::{MovimentacaoRepository, PgMovimentacaoRepository};
pub mod estoque_repo;
pub use estoque_repo::{EstoqueRepository, PgEstoqueRepository};
pub mod requisicao_repo;
pub use requisicao_repo::{PgRequisicaoRepository, RequisicaoRepository};
pub mod colaborador_repo;
pub use colaborador_repo::{ColaboradorRepository, PgColaboradorRepository};
