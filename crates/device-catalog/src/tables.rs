use crate::ids::*;
use crate::types::{
    AccessLevel, ArgumentDescriptor, DataType, DefaultValue, DeviceTypeId, ErrorDescriptor,
    MethodDescriptor, VariableDescriptor,
};

pub(crate) struct DeviceTable {
    pub variables: &'static [VariableDescriptor],
    pub errors: &'static [ErrorDescriptor],
    pub methods: &'static [MethodDescriptor],
}

pub(crate) fn table(device_type: DeviceTypeId) -> DeviceTable {
    match device_type {
        DeviceTypeId::Edge => DeviceTable {
            variables: EDGE_VARIABLES,
            errors: &[],
            methods: EDGE_METHODS,
        },
        DeviceTypeId::Mpes => DeviceTable {
            variables: MPES_VARIABLES,
            errors: &[],
            methods: MPES_METHODS,
        },
        DeviceTypeId::Panel => DeviceTable {
            variables: PANEL_VARIABLES,
            errors: &[],
            methods: PANEL_METHODS,
        },
        DeviceTypeId::Actuator => DeviceTable {
            variables: ACTUATOR_VARIABLES,
            errors: ACTUATOR_ERRORS,
            methods: ACTUATOR_METHODS,
        },
        DeviceTypeId::Ccd => DeviceTable {
            variables: CCD_VARIABLES,
            errors: &[],
            methods: CCD_METHODS,
        },
        DeviceTypeId::Psd => DeviceTable {
            variables: PSD_VARIABLES,
            errors: &[],
            methods: PSD_METHODS,
        },
        DeviceTypeId::Rangefinder => DeviceTable {
            variables: RANGEFINDER_VARIABLES,
            errors: &[],
            methods: RANGEFINDER_METHODS,
        },
    }
}

const fn state(field_id: u32) -> VariableDescriptor {
    VariableDescriptor {
        field_id,
        name: "State",
        default_value: DefaultValue::Int(0),
        is_state: true,
        access: AccessLevel::Read,
    }
}

const fn reading(field_id: u32, name: &'static str) -> VariableDescriptor {
    VariableDescriptor {
        field_id,
        name,
        default_value: DefaultValue::Double(0.0),
        is_state: false,
        access: AccessLevel::Read,
    }
}

const fn arg(
    name: &'static str,
    data_type: DataType,
    description: &'static str,
) -> ArgumentDescriptor {
    ArgumentDescriptor {
        name,
        data_type,
        description,
        default_value: None,
    }
}

const fn method(
    field_id: u32,
    name: &'static str,
    arguments: &'static [ArgumentDescriptor],
) -> MethodDescriptor {
    MethodDescriptor {
        field_id,
        name,
        arguments,
    }
}

const fn fault(field_id: u32, name: &'static str, description: &'static str) -> ErrorDescriptor {
    ErrorDescriptor {
        field_id,
        name,
        description,
        default_value: DefaultValue::Bool(false),
        is_state: false,
    }
}

// Edge (1000)

static EDGE_VARIABLES: &[VariableDescriptor] =
    &[state(EDGE_STATE), reading(EDGE_POSITION, "Position")];

static EDGE_METHODS: &[MethodDescriptor] = &[
    method(EDGE_START, "Start", &[]),
    method(EDGE_READ, "Read", &[]),
    method(EDGE_STOP, "Stop", &[]),
    method(EDGE_FIND_MATRIX, "FindMatrix", FIND_MATRIX_ARGS),
    method(EDGE_ALIGN, "Align", ALIGN_ARGS),
    method(EDGE_MOVE, "Move", &[]),
];

const FIND_MATRIX_ARGS: &[ArgumentDescriptor] = &[arg(
    "stepSizeMm",
    DataType::Double,
    "Actuator step size (in mm) used while probing the response matrix.",
)];

const ALIGN_ARGS: &[ArgumentDescriptor] = &[
    arg(
        "panelToMove",
        DataType::UInt32,
        "Position of the panel to move during alignment.",
    ),
    arg(
        "panelToFix",
        DataType::UInt32,
        "Position of the panel to keep fixed during alignment.",
    ),
    ArgumentDescriptor {
        name: "alignFraction",
        data_type: DataType::Double,
        description: "Fraction of the computed motion to execute, in (0, 1].",
        default_value: Some(DefaultValue::Double(0.25)),
    },
    arg(
        "execute",
        DataType::Boolean,
        "Execute the motion (true) or only compute and report it (false).",
    ),
];

// MPES (1100)

static MPES_VARIABLES: &[VariableDescriptor] = &[
    state(MPES_STATE),
    reading(MPES_X_CENTROID_AVG, "xCentroidAvg"),
    reading(MPES_Y_CENTROID_AVG, "yCentroidAvg"),
    reading(MPES_X_CENTROID_SD, "xCentroidSD"),
    reading(MPES_Y_CENTROID_SD, "yCentroidSD"),
    reading(MPES_CLEANED_INTENSITY, "CleanedIntensity"),
    reading(MPES_X_CENTROID_NOMINAL, "xCentroidNominal"),
    reading(MPES_Y_CENTROID_NOMINAL, "yCentroidNominal"),
];

static MPES_METHODS: &[MethodDescriptor] = &[
    method(MPES_START, "Start", &[]),
    method(MPES_STOP, "Stop", &[]),
    method(MPES_READ, "Read", &[]),
    method(MPES_SET_EXPOSURE, "SetExposure", &[]),
];

// Panel (2000)

static PANEL_VARIABLES: &[VariableDescriptor] = &[
    state(PANEL_STATE),
    reading(PANEL_EXTERNAL_TEMPERATURE, "ExternalTemperature"),
    reading(PANEL_INTERNAL_TEMPERATURE, "InternalTemperature"),
    reading(PANEL_X, "x"),
    reading(PANEL_Y, "y"),
    reading(PANEL_Z, "z"),
    reading(PANEL_X_ROT, "xRot"),
    reading(PANEL_Y_ROT, "yRot"),
    reading(PANEL_Z_ROT, "zRot"),
    VariableDescriptor {
        field_id: PANEL_SAFETY_RADIUS,
        name: "SafetyRadius",
        default_value: DefaultValue::Double(60.0),
        is_state: false,
        access: AccessLevel::ReadWrite,
    },
];

static PANEL_METHODS: &[MethodDescriptor] = &[
    method(PANEL_MOVE_DELTA_LENGTHS, "MoveDeltaLengths", MOVE_DELTA_LENGTHS_ARGS),
    method(PANEL_MOVE_TO_LENGTHS, "MoveToLengths", MOVE_TO_LENGTHS_ARGS),
    method(PANEL_MOVE_TO_COORDS, "MoveToCoords", MOVE_TO_COORDS_ARGS),
    method(PANEL_READ_POSITION, "ReadPosition", &[]),
    method(PANEL_FIND_HOME, "FindHome", FIND_HOME_ARGS),
    method(PANEL_CLEAR_ERROR, "ClearError", CLEAR_ERROR_ARGS),
    method(PANEL_CLEAR_ALL_ERRORS, "ClearAllErrors", &[]),
    method(PANEL_CLEAR_ACTUATOR_ERRORS, "ClearActuatorErrors", &[]),
    method(PANEL_CLEAR_PLATFORM_ERRORS, "ClearPlatformErrors", &[]),
    method(PANEL_STOP, "Stop", &[]),
];

const MOVE_DELTA_LENGTHS_ARGS: &[ArgumentDescriptor] = &[
    arg("Delta Length 1", DataType::Float, "Desired change in length for Actuator 1 (in mm)."),
    arg("Delta Length 2", DataType::Float, "Desired change in length for Actuator 2 (in mm)."),
    arg("Delta Length 3", DataType::Float, "Desired change in length for Actuator 3 (in mm)."),
    arg("Delta Length 4", DataType::Float, "Desired change in length for Actuator 4 (in mm)."),
    arg("Delta Length 5", DataType::Float, "Desired change in length for Actuator 5 (in mm)."),
    arg("Delta Length 6", DataType::Float, "Desired change in length for Actuator 6 (in mm)."),
];

const MOVE_TO_LENGTHS_ARGS: &[ArgumentDescriptor] = &[
    arg("Length Actuator 1", DataType::Float, "Target length for Actuator 1 (in mm)."),
    arg("Length Actuator 2", DataType::Float, "Target length for Actuator 2 (in mm)."),
    arg("Length Actuator 3", DataType::Float, "Target length for Actuator 3 (in mm)."),
    arg("Length Actuator 4", DataType::Float, "Target length for Actuator 4 (in mm)."),
    arg("Length Actuator 5", DataType::Float, "Target length for Actuator 5 (in mm)."),
    arg("Length Actuator 6", DataType::Float, "Target length for Actuator 6 (in mm)."),
];

const MOVE_TO_COORDS_ARGS: &[ArgumentDescriptor] = &[
    arg("x", DataType::Double, "Target x position (in mm)."),
    arg("y", DataType::Double, "Target y position (in mm)."),
    arg("z", DataType::Double, "Target z position (in mm)."),
    arg("xRot", DataType::Double, "Target rotation about x (in rad)."),
    arg("yRot", DataType::Double, "Target rotation about y (in rad)."),
    arg("zRot", DataType::Double, "Target rotation about z (in rad)."),
];

const FIND_HOME_ARGS: &[ArgumentDescriptor] = &[arg(
    "direction",
    DataType::Int32,
    "End stop to home against: 1 (extend) or -1 (retract).",
)];

const CLEAR_ERROR_ARGS: &[ArgumentDescriptor] =
    &[arg("errorNum", DataType::Int32, "Index of the error to clear.")];

// Actuator (2100)

static ACTUATOR_VARIABLES: &[VariableDescriptor] = &[
    state(ACTUATOR_STATE),
    reading(ACTUATOR_CURRENT_LENGTH, "CurrentLength"),
    reading(ACTUATOR_TARGET_LENGTH, "TargetLength"),
    reading(ACTUATOR_DELTA_LENGTH, "DeltaLength"),
];

static ACTUATOR_ERRORS: &[ErrorDescriptor] = &[
    fault(ACTUATOR_ERROR0, "Error0", "DBFlagNotSet"),
    fault(ACTUATOR_ERROR1, "Error1", "MySQL Communication Error"),
    fault(ACTUATOR_ERROR2, "Error2", "DB Columns does not match what is expected"),
    fault(ACTUATOR_ERROR3, "Error3", "ASF File is Bad / DNE"),
    fault(ACTUATOR_ERROR4, "Error4", "ASF File entries does not match what is expected"),
    fault(ACTUATOR_ERROR5, "Error5", "ASF File is Bad / Cannot be written to"),
    fault(ACTUATOR_ERROR6, "Error6", "Voltage Std Dev is entirely too high"),
    fault(ACTUATOR_ERROR7, "Error7", "Voltage Std Dev is a little high"),
    fault(ACTUATOR_ERROR8, "Error8", "Actuator Missed too many steps"),
    fault(ACTUATOR_ERROR9, "Error9", "Actuator position is too many steps away to recover safely"),
    fault(ACTUATOR_ERROR10, "Error10", "Actuator position is recovering large amount of steps"),
    fault(ACTUATOR_ERROR11, "Error11", "Extend Stop Voltage is too close to the discontinuity"),
    fault(ACTUATOR_ERROR12, "Error12", "End stop is large number of steps away from what is expected"),
    fault(ACTUATOR_ERROR13, "Error13", "Steps from extend stop disagree with recorded steps from end stop"),
];

static ACTUATOR_METHODS: &[MethodDescriptor] = &[
    method(ACTUATOR_START, "Start", &[]),
    method(ACTUATOR_STOP, "Stop", &[]),
    method(ACTUATOR_MOVE_DELTA_LENGTH, "MoveDeltaLength", MOVE_DELTA_LENGTH_ARGS),
    method(ACTUATOR_MOVE_TO_LENGTH, "MoveToLength", MOVE_TO_LENGTH_ARGS),
    method(ACTUATOR_CLEAR_ERROR, "ClearError", CLEAR_ERROR_ARGS),
    method(ACTUATOR_CLEAR_ALL_ERRORS, "ClearAllErrors", &[]),
];

const MOVE_DELTA_LENGTH_ARGS: &[ArgumentDescriptor] =
    &[arg("deltaLength", DataType::Float, "Desired change in length (in mm).")];

const MOVE_TO_LENGTH_ARGS: &[ArgumentDescriptor] =
    &[arg("targetLength", DataType::Float, "Target length (in mm).")];

// CCD (3100)

static CCD_VARIABLES: &[VariableDescriptor] = &[
    state(CCD_STATE),
    reading(CCD_X_FROM_LED, "xFromLED"),
    reading(CCD_Y_FROM_LED, "yFromLED"),
    reading(CCD_Z_FROM_LED, "zFromLED"),
    reading(CCD_PSI_FROM_LED, "psiFromLED"),
    reading(CCD_THETA_FROM_LED, "thetaFromLED"),
    reading(CCD_PHI_FROM_LED, "phiFromLED"),
    reading(CCD_X_NOMINAL, "xNominal"),
    reading(CCD_Y_NOMINAL, "yNominal"),
    reading(CCD_Z_NOMINAL, "zNominal"),
    reading(CCD_PSI_NOMINAL, "psiNominal"),
    reading(CCD_THETA_NOMINAL, "thetaNominal"),
    reading(CCD_PHI_NOMINAL, "phiNominal"),
];

static CCD_METHODS: &[MethodDescriptor] = &[
    method(CCD_START, "Start", &[]),
    method(CCD_STOP, "Stop", &[]),
    method(CCD_READ, "Read", &[]),
];

// PSD (3200)

static PSD_VARIABLES: &[VariableDescriptor] = &[
    state(PSD_STATE),
    reading(PSD_X1, "x1"),
    reading(PSD_Y1, "y1"),
    reading(PSD_X2, "x2"),
    reading(PSD_Y2, "y2"),
    reading(PSD_DX1, "dx1"),
    reading(PSD_DY1, "dy1"),
    reading(PSD_DX2, "dx2"),
    reading(PSD_DY2, "dy2"),
    reading(PSD_TEMP, "Temp"),
];

static PSD_METHODS: &[MethodDescriptor] = &[method(PSD_READ, "Read", &[])];

// Rangefinder (3300)

static RANGEFINDER_VARIABLES: &[VariableDescriptor] =
    &[state(RANGEFINDER_STATE), reading(RANGEFINDER_TEMP, "Temp")];

static RANGEFINDER_METHODS: &[MethodDescriptor] = &[
    method(RANGEFINDER_TURN_ON, "TurnOn", &[]),
    method(RANGEFINDER_TURN_OFF, "TurnOff", &[]),
    method(RANGEFINDER_READ, "Read", &[]),
];
