//! tonic client for `hearth.v1.ClientCommands`.

use tonic::GrpcMethod;
use tonic::codec::Streaming;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{IntoRequest, Request, Response, Status};

use crate::methods;

use super::{
    AccountCreateRequest, AccountCreateResponse, AccountLocalLinkCreateAppRequest,
    AccountLocalLinkCreateAppResponse, AccountLocalLinkListAppsRequest,
    AccountLocalLinkListAppsResponse, AccountLocalLinkRevokeAppRequest,
    AccountLocalLinkRevokeAppResponse, AccountRecoverRequest, AccountRecoverResponse,
    AccountSelectRequest, AccountSelectResponse, AccountStopRequest, AccountStopResponse,
    AppGetVersionRequest, AppGetVersionResponse, Event, InitialSetParametersRequest,
    InitialSetParametersResponse, ObjectSearchRequest, ObjectSearchResponse, SpaceDeleteRequest,
    SpaceDeleteResponse, SpaceInviteViewRequest, SpaceInviteViewResponse, SpaceJoinRequest,
    SpaceJoinResponse, SpaceRequestApproveRequest, SpaceRequestApproveResponse, StreamRequest,
    WalletCloseSessionRequest, WalletCloseSessionResponse, WalletCreateRequest,
    WalletCreateResponse, WalletCreateSessionRequest, WalletCreateSessionResponse,
    WalletRecoverRequest, WalletRecoverResponse,
};

/// Client for the `ClientCommands` service.
#[derive(Debug, Clone)]
pub struct ClientCommandsClient {
    inner: tonic::client::Grpc<Channel>,
}

macro_rules! unary_method {
    ($(#[$doc:meta])* $name:ident, $req:ty, $resp:ty, $path:expr) => {
        $(#[$doc])*
        pub async fn $name(
            &mut self,
            request: impl IntoRequest<$req>,
        ) -> Result<Response<$resp>, Status> {
            self.unary(request.into_request(), $path).await
        }
    };
}

impl ClientCommandsClient {
    /// Dial `dst` and build a client over the resulting channel.
    pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
    where
        D: TryInto<Endpoint>,
        D::Error: Into<tonic::codegen::StdError>,
    {
        let conn = Endpoint::new(dst)?.connect().await?;
        Ok(Self::new(conn))
    }

    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn ready(&mut self) -> Result<(), Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unavailable(format!("Service was not ready: {e}")))
    }

    async fn unary<Req, Resp>(
        &mut self,
        mut request: Request<Req>,
        path: &'static str,
    ) -> Result<Response<Resp>, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.ready().await?;
        request
            .extensions_mut()
            .insert(GrpcMethod::new(methods::SERVICE, methods::method_name(path)));
        let codec = tonic_prost::ProstCodec::default();
        self.inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await
    }

    unary_method!(
        initial_set_parameters,
        InitialSetParametersRequest,
        InitialSetParametersResponse,
        methods::INITIAL_SET_PARAMETERS
    );

    unary_method!(
        app_get_version,
        AppGetVersionRequest,
        AppGetVersionResponse,
        methods::APP_GET_VERSION
    );

    unary_method!(
        wallet_create,
        WalletCreateRequest,
        WalletCreateResponse,
        methods::WALLET_CREATE
    );

    unary_method!(
        wallet_recover,
        WalletRecoverRequest,
        WalletRecoverResponse,
        methods::WALLET_RECOVER
    );

    unary_method!(
        wallet_create_session,
        WalletCreateSessionRequest,
        WalletCreateSessionResponse,
        methods::WALLET_CREATE_SESSION
    );

    unary_method!(
        wallet_close_session,
        WalletCloseSessionRequest,
        WalletCloseSessionResponse,
        methods::WALLET_CLOSE_SESSION
    );

    unary_method!(
        account_create,
        AccountCreateRequest,
        AccountCreateResponse,
        methods::ACCOUNT_CREATE
    );

    unary_method!(
        /// Ask the server to recover the account for the current wallet.
        /// The account id arrives later as an `AccountShow` event.
        account_recover,
        AccountRecoverRequest,
        AccountRecoverResponse,
        methods::ACCOUNT_RECOVER
    );

    unary_method!(
        account_select,
        AccountSelectRequest,
        AccountSelectResponse,
        methods::ACCOUNT_SELECT
    );

    unary_method!(
        account_stop,
        AccountStopRequest,
        AccountStopResponse,
        methods::ACCOUNT_STOP
    );

    unary_method!(
        space_invite_view,
        SpaceInviteViewRequest,
        SpaceInviteViewResponse,
        methods::SPACE_INVITE_VIEW
    );

    unary_method!(
        space_join,
        SpaceJoinRequest,
        SpaceJoinResponse,
        methods::SPACE_JOIN
    );

    unary_method!(
        space_delete,
        SpaceDeleteRequest,
        SpaceDeleteResponse,
        methods::SPACE_DELETE
    );

    unary_method!(
        space_request_approve,
        SpaceRequestApproveRequest,
        SpaceRequestApproveResponse,
        methods::SPACE_REQUEST_APPROVE
    );

    unary_method!(
        object_search,
        ObjectSearchRequest,
        ObjectSearchResponse,
        methods::OBJECT_SEARCH
    );

    unary_method!(
        /// Create an API key for a local app. The key is only returned here.
        account_local_link_create_app,
        AccountLocalLinkCreateAppRequest,
        AccountLocalLinkCreateAppResponse,
        methods::ACCOUNT_LOCAL_LINK_CREATE_APP
    );

    unary_method!(
        account_local_link_list_apps,
        AccountLocalLinkListAppsRequest,
        AccountLocalLinkListAppsResponse,
        methods::ACCOUNT_LOCAL_LINK_LIST_APPS
    );

    unary_method!(
        account_local_link_revoke_app,
        AccountLocalLinkRevokeAppRequest,
        AccountLocalLinkRevokeAppResponse,
        methods::ACCOUNT_LOCAL_LINK_REVOKE_APP
    );

    /// Open the session push stream.
    pub async fn listen_session_events(
        &mut self,
        request: impl IntoRequest<StreamRequest>,
    ) -> Result<Response<Streaming<Event>>, Status> {
        self.ready().await?;
        let mut request = request.into_request();
        request.extensions_mut().insert(GrpcMethod::new(
            methods::SERVICE,
            methods::method_name(methods::LISTEN_SESSION_EVENTS),
        ));
        let codec = tonic_prost::ProstCodec::default();
        self.inner
            .server_streaming(
                request,
                PathAndQuery::from_static(methods::LISTEN_SESSION_EVENTS),
                codec,
            )
            .await
    }
}
