//! Blocking ZMQ client for the simulator's remote API.

use ciborium::Value;
use nalgebra::Vector3;
use quadcap_core::{ObjectHandle, SensorImage, SimError, SimulatorApi};
use tokio::runtime::Runtime;
use tracing::{info, trace};
use uuid::Uuid;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, ZmqMessage};

use crate::protocol::{self, as_bytes, as_i64, as_vector3, first, int_arg, vector_arg};

/// Port the simulator's ZMQ remote API add-on listens on by default.
pub const DEFAULT_PORT: u16 = 23000;

/// Client for one simulator instance.
///
/// Calls block until the simulator replies; the socket runs on a private
/// tokio runtime so callers stay synchronous.
pub struct RemoteApiClient {
    // Dropped before the runtime that drives it.
    socket: ReqSocket,
    runtime: Runtime,
    uuid: String,
    endpoint: String,
}

impl RemoteApiClient {
    /// Connect to the remote API at `tcp://host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self, SimError> {
        let endpoint = format!("tcp://{host}:{port}");

        // Socket tasks only run while a call blocks on this runtime.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SimError::Transport(e.to_string()))?;

        let mut socket = ReqSocket::new();
        runtime
            .block_on(socket.connect(&endpoint))
            .map_err(|e| SimError::Transport(format!("{endpoint}: {e}")))?;

        info!(%endpoint, "Connected to simulator");

        Ok(Self {
            socket,
            runtime,
            uuid: Uuid::new_v4().to_string(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call a remote function and return its return values.
    pub fn call(&mut self, func: &str, args: Vec<Value>) -> Result<Vec<Value>, SimError> {
        let request = protocol::encode_request(func, args, &self.uuid)?;
        trace!(func, bytes = request.len(), "Remote call");

        let socket = &mut self.socket;
        let reply = self
            .runtime
            .block_on(async move {
                socket.send(ZmqMessage::from(request)).await?;
                socket.recv().await
            })
            .map_err(|e| SimError::Transport(e.to_string()))?;

        let frame = reply.get(0).ok_or_else(|| SimError::UnexpectedReply {
            func: func.to_string(),
            detail: "empty message".to_string(),
        })?;
        protocol::decode_reply(func, &frame[..])
    }

    fn call_unit(&mut self, func: &str, args: Vec<Value>) -> Result<(), SimError> {
        self.call(func, args).map(|_| ())
    }
}

impl SimulatorApi for RemoteApiClient {
    fn start_simulation(&mut self) -> Result<(), SimError> {
        self.call_unit("sim.startSimulation", vec![])
    }

    fn stop_simulation(&mut self) -> Result<(), SimError> {
        self.call_unit("sim.stopSimulation", vec![])
    }

    fn set_stepping(&mut self, enabled: bool) -> Result<(), SimError> {
        self.call_unit("sim.setStepping", vec![Value::Bool(enabled)])
    }

    fn step(&mut self) -> Result<(), SimError> {
        self.call_unit("sim.step", vec![])
    }

    fn object_handle(&mut self, name: &str) -> Result<ObjectHandle, SimError> {
        const FUNC: &str = "sim.getObject";
        let ret = self.call(FUNC, vec![Value::Text(name.to_string())])?;
        Ok(ObjectHandle(as_i64(FUNC, first(FUNC, &ret)?)?))
    }

    fn object_position(&mut self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError> {
        const FUNC: &str = "sim.getObjectPosition";
        let ret = self.call(FUNC, vec![int_arg(handle.0), int_arg(ObjectHandle::WORLD.0)])?;
        as_vector3(FUNC, first(FUNC, &ret)?)
    }

    fn object_orientation(&mut self, handle: ObjectHandle) -> Result<Vector3<f64>, SimError> {
        const FUNC: &str = "sim.getObjectOrientation";
        let ret = self.call(FUNC, vec![int_arg(handle.0), int_arg(ObjectHandle::WORLD.0)])?;
        as_vector3(FUNC, first(FUNC, &ret)?)
    }

    fn set_object_position(&mut self, handle: ObjectHandle, position: &Vector3<f64>) -> Result<(), SimError> {
        self.call_unit(
            "sim.setObjectPosition",
            vec![int_arg(handle.0), int_arg(ObjectHandle::WORLD.0), vector_arg(position)],
        )
    }

    fn set_object_orientation(&mut self, handle: ObjectHandle, orientation: &Vector3<f64>) -> Result<(), SimError> {
        self.call_unit(
            "sim.setObjectOrientation",
            vec![int_arg(handle.0), int_arg(ObjectHandle::WORLD.0), vector_arg(orientation)],
        )
    }

    fn vision_sensor_image(&mut self, handle: ObjectHandle) -> Result<SensorImage, SimError> {
        const FUNC: &str = "sim.getVisionSensorImg";
        let ret = self.call(FUNC, vec![int_arg(handle.0)])?;
        if ret.len() < 2 {
            return Err(SimError::UnexpectedReply {
                func: FUNC.to_string(),
                detail: format!("expected image and resolution, got {} values", ret.len()),
            });
        }

        let rgb = as_bytes(FUNC, &ret[0])?;
        let resolution = match &ret[1] {
            Value::Array(dims) if dims.len() == 2 => (as_i64(FUNC, &dims[0])?, as_i64(FUNC, &dims[1])?),
            other => {
                return Err(SimError::UnexpectedReply {
                    func: FUNC.to_string(),
                    detail: format!("bad resolution {other:?}"),
                })
            }
        };
        let (width, height) = match (u32::try_from(resolution.0), u32::try_from(resolution.1)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(SimError::UnexpectedReply {
                    func: FUNC.to_string(),
                    detail: format!("bad resolution {resolution:?}"),
                })
            }
        };

        Ok(SensorImage { width, height, rgb })
    }
}

/// Connect, switch the simulator to stepping mode and start the simulation.
pub fn init_simulation(host: &str, port: u16) -> Result<RemoteApiClient, SimError> {
    let mut client = RemoteApiClient::connect(host, port)?;
    client.set_stepping(true)?;
    client.start_simulation()?;
    info!("Simulation started in stepping mode");
    Ok(client)
}
