//! # meshsim-proto::firmware::echo
//!
//! The simplest possible firmware: echoes every received payload straight
//! back to its sender. Useful as a smoke-test firmware for exercising the
//! network plane in isolation from any real application logic.

use meshsim_types::id::NodeId;

use crate::api::Firmware;
use crate::ctx_ext::FirmwareCtx;

#[derive(Default)]
pub struct Echo {
    id: Option<NodeId>,
    echoed: u64,
}

impl Firmware for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn setup(&mut self, ctx: &mut FirmwareCtx<'_>) {
        self.id = Some(ctx.node_id());
        ctx.log_kv("role", "echo");
        tracing::info!(node_id = ctx.node_id().get(), "echo firmware started");
    }

    fn tick(&mut self, _ctx: &mut FirmwareCtx<'_>) {}

    fn on_receive(&mut self, ctx: &mut FirmwareCtx<'_>, from: NodeId, payload: &[u8]) {
        self.echoed += 1;
        ctx.log_kv("echoed", &self.echoed.to_string());
        ctx.send(from, payload.to_vec());
    }
}
