/// Instruction opcodes. Values are dense so the executor can index a flat handler table.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Nop = 0,
    BindPipeline = 1,
    BindVertexBuffers = 2,
    BindIndexBuffer = 3,
    PushConstants = 4,
    SetViewports = 5,
    SetScissors = 6,
    SetLineWidth = 7,
    SetDepthBias = 8,
    SetBlendConstants = 9,
    Draw = 10,
    DrawIndexed = 11,
    DrawIndirect = 12,
    DrawIndexedIndirect = 13,
    Dispatch = 14,
    DispatchIndirect = 15,
    CopyBuffer = 16,
    UpdateBuffer = 17,
    FillBuffer = 18,
    CopyBufferToImage = 19,
    CopyImageToBuffer = 20,
    CopyImage = 21,
    AttachTransferTarget = 22,
    BlitFramebuffer = 23,
    ClearColor = 24,
    ClearDepthStencil = 25,
    BeginRenderPass = 26,
    EndRenderPass = 27,
    PipelineBarrier = 28,
    BeginDebugLabel = 29,
    EndDebugLabel = 30,
}

impl Opcode {
    pub const COUNT: usize = 31;

    pub const ALL: [Opcode; Opcode::COUNT] = [
        Opcode::Nop,
        Opcode::BindPipeline,
        Opcode::BindVertexBuffers,
        Opcode::BindIndexBuffer,
        Opcode::PushConstants,
        Opcode::SetViewports,
        Opcode::SetScissors,
        Opcode::SetLineWidth,
        Opcode::SetDepthBias,
        Opcode::SetBlendConstants,
        Opcode::Draw,
        Opcode::DrawIndexed,
        Opcode::DrawIndirect,
        Opcode::DrawIndexedIndirect,
        Opcode::Dispatch,
        Opcode::DispatchIndirect,
        Opcode::CopyBuffer,
        Opcode::UpdateBuffer,
        Opcode::FillBuffer,
        Opcode::CopyBufferToImage,
        Opcode::CopyImageToBuffer,
        Opcode::CopyImage,
        Opcode::AttachTransferTarget,
        Opcode::BlitFramebuffer,
        Opcode::ClearColor,
        Opcode::ClearDepthStencil,
        Opcode::BeginRenderPass,
        Opcode::EndRenderPass,
        Opcode::PipelineBarrier,
        Opcode::BeginDebugLabel,
        Opcode::EndDebugLabel,
    ];

    pub const fn from_u32(v: u32) -> Option<Self> {
        if (v as usize) < Self::COUNT {
            Some(Self::ALL[v as usize])
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_order_matches_discriminants() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
            assert_eq!(Opcode::from_u32(i as u32), Some(*op));
        }
        assert_eq!(Opcode::from_u32(Opcode::COUNT as u32), None);
    }
}
