//! Driving ports (API exposed to other subsystems)

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{Block, BlockContent, ConsensusMessage};

use crate::domain::BlockLogResult;

/// Invoked once per committed block, in index order.
pub type CommitCallback = Arc<dyn Fn(&Block) + Send + Sync>;

pub trait BlockLogApi: Send + Sync {
    /// Propose `content` for the next position.
    ///
    /// Returns the proposed block. Commit is reported through
    /// [`on_commit`](Self::on_commit); the committed block may carry another
    /// node's content if that proposal won.
    fn propose(&self, content: BlockContent) -> BlockLogResult<Block>;

    /// Feed a consensus message received from `origin`.
    fn handle_message(&self, origin: &str, message: ConsensusMessage);

    /// `(tail hash hex, blocks by hash hex)`; the tail is all zeros when empty.
    fn get_chain(&self) -> (String, HashMap<String, Block>);

    fn on_commit(&self, callback: CommitCallback);

    /// Drop the in-flight local proposal without committing it.
    fn abandon_round(&self);
}
