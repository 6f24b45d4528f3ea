use serde::{Deserialize, Serialize};

/// Raw result codes reported by the WeChat Open SDK (`BaseResp.ErrCode`).
pub mod codes {
    pub const OK: i32 = 0;
    pub const COMM: i32 = -1;
    pub const USER_CANCELLED: i32 = -2;
    pub const SENT_FAILED: i32 = -3;
    pub const AUTH_DENIED: i32 = -4;
    pub const UNSUPPORTED: i32 = -5;
}

/// The five-way classification WeChat uses to multiplex asynchronous
/// responses back to the dispatching application.
///
/// Every vendor interaction belongs to exactly one kind, and the bridge
/// allows at most one in-flight request per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Share,
    Auth,
    Pay,
    MiniProgram,
    Invoice,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Share,
        OperationKind::Auth,
        OperationKind::Pay,
        OperationKind::MiniProgram,
        OperationKind::Invoice,
    ];
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Share => "share",
            OperationKind::Auth => "auth",
            OperationKind::Pay => "pay",
            OperationKind::MiniProgram => "mini-program",
            OperationKind::Invoice => "invoice",
        };
        f.write_str(name)
    }
}

/// Destination context for a share (`SendMessageToWX.Req` scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scene {
    /// A single conversation.
    Session,
    /// The public moments timeline.
    Timeline,
    /// The user's favorites.
    Favorite,
}

impl Scene {
    pub fn value(self) -> i32 {
        match self {
            Scene::Session => 0,
            Scene::Timeline => 1,
            Scene::Favorite => 2,
        }
    }
}

impl TryFrom<i32> for Scene {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Scene::Session),
            1 => Ok(Scene::Timeline),
            2 => Ok(Scene::Favorite),
            other => Err(format!("unknown share scene: {other}")),
        }
    }
}

/// Which build of a mini-program to open (`WXLaunchMiniProgram` type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MiniProgramType {
    #[default]
    Release,
    Test,
    Preview,
}

impl MiniProgramType {
    pub fn value(self) -> i32 {
        match self {
            MiniProgramType::Release => 0,
            MiniProgramType::Test => 1,
            MiniProgramType::Preview => 2,
        }
    }
}

impl TryFrom<i32> for MiniProgramType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MiniProgramType::Release),
            1 => Ok(MiniProgramType::Test),
            2 => Ok(MiniProgramType::Preview),
            other => Err(format!("unknown mini-program type: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_round_trip() {
        for scene in [Scene::Session, Scene::Timeline, Scene::Favorite] {
            assert_eq!(Scene::try_from(scene.value()).unwrap(), scene);
        }
    }

    #[test]
    fn test_scene_rejects_unknown_value() {
        assert!(Scene::try_from(3).is_err());
        assert!(Scene::try_from(-1).is_err());
    }

    #[test]
    fn test_mini_program_type_defaults_to_release() {
        assert_eq!(MiniProgramType::default(), MiniProgramType::Release);
        assert_eq!(MiniProgramType::default().value(), 0);
    }

    #[test]
    fn test_operation_kind_display() {
        assert_eq!(OperationKind::MiniProgram.to_string(), "mini-program");
        assert_eq!(OperationKind::Share.to_string(), "share");
    }
}
